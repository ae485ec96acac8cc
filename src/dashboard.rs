use crate::entities::{call, call_schedule, Call};
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone, Utc,
};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::Serialize;

use crate::scheduler::weekday_name;

pub const CALL_LIST_PAGE_SIZE: u64 = 5;
pub const RECENT_CALLS_LIMIT: u64 = 10;

#[derive(Serialize)]
pub struct ElderBasicInfo {
    pub id: i32,
    pub name: String,
    pub relation: String,
    pub service_days: i64,
}

#[derive(Serialize)]
pub struct TodayHighlight {
    pub message: String,
    pub call_time: String,
    pub emotion: String,
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct CallAttemptsStats {
    pub count: u64,
}

#[derive(Serialize)]
pub struct CallSuccessStats {
    pub count: u64,
}

#[derive(Serialize)]
pub struct AvgDurationStats {
    pub minutes: i64,
}

#[derive(Serialize)]
pub struct WeeklyStats {
    pub call_attempts: CallAttemptsStats,
    pub call_success_count: CallSuccessStats,
    pub avg_duration: AvgDurationStats,
}

#[derive(Serialize, Clone)]
pub struct RecentCallItem {
    pub id: i32,
    /// "2025.07.21"
    pub date: String,
    /// "10:30"
    pub time: String,
    pub duration_minutes: i64,
    pub summary: String,
    pub tags: Vec<String>,
    pub emotion: Option<String>,
    pub status: String,
}

#[derive(Serialize)]
pub struct NextScheduledCall {
    pub datetime: NaiveDateTime,
    /// "2025년 7월 21일"
    pub date_display: String,
    /// "10:00"
    pub time_display: String,
    pub is_today: bool,
}

#[derive(Serialize)]
pub struct WeeklyScheduleItem {
    /// "월요일".."일요일"
    pub day_of_week: String,
    /// "2025-07-21"
    pub date: String,
    /// "7월 21일"
    pub date_display: String,
    pub scheduled_times: Vec<String>,
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub elder: ElderBasicInfo,
    pub today_highlight: Option<TodayHighlight>,
    pub weekly_stats: WeeklyStats,
    pub recent_calls: Vec<RecentCallItem>,
    pub next_scheduled_call: Option<NextScheduledCall>,
    pub this_week_schedule: Vec<WeeklyScheduleItem>,
}

#[derive(Serialize)]
pub struct CallListResponse {
    pub items: Vec<RecentCallItem>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Serialize)]
pub struct CallMessageItem {
    pub role: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Serialize)]
pub struct CallDetailResponse {
    pub id: i32,
    pub elder_name: String,
    /// "2025년 07월 21일"
    pub date: String,
    /// "10:30 AM"
    pub time: String,
    /// "5분 32초"
    pub duration: String,
    pub status: String,
    pub emotion: Option<String>,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub messages: Vec<CallMessageItem>,
}

/// Monday 00:00 of `target`'s week through the following Monday 00:00.
pub fn week_range(target: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
    let days_since_monday = target.weekday().num_days_from_monday() as i64;
    let week_start = (target.date() - Duration::days(days_since_monday))
        .and_hms_opt(0, 0, 0)
        .unwrap_or(target);
    (week_start, week_start + Duration::days(7))
}

pub fn service_days(begin_date: NaiveDateTime, today: NaiveDate) -> i64 {
    (today - begin_date.date()).num_days()
}

// Schedule times are deployment-local; call rows carry offsets. Local-naive
// bounds get pinned to the local offset before hitting the timestamptz
// column.
fn to_fixed(naive: NaiveDateTime) -> DateTime<FixedOffset> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive).fixed_offset())
}

pub fn tags_to_vec(tags: &Option<serde_json::Value>) -> Vec<String> {
    tags.as_ref()
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|t| t.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

fn call_duration_minutes(call: &call::Model) -> i64 {
    call.ended_at
        .map(|ended| (ended - call.started_at).num_seconds() / 60)
        .unwrap_or(0)
}

fn recent_call_item(call: &call::Model) -> RecentCallItem {
    let started = call.started_at.naive_local();
    RecentCallItem {
        id: call.id,
        date: started.format("%Y.%m.%d").to_string(),
        time: started.format("%H:%M").to_string(),
        duration_minutes: call_duration_minutes(call),
        summary: call.summary.clone().unwrap_or_default(),
        tags: tags_to_vec(&call.tags),
        emotion: call.emotion.clone(),
        status: call.status.clone(),
    }
}

pub async fn weekly_stats(
    db: &DatabaseConnection,
    elder_id: i32,
    week_start: NaiveDateTime,
    week_end: NaiveDateTime,
) -> Result<WeeklyStats, DbErr> {
    let week_calls = Call::find()
        .filter(call::Column::ElderId.eq(elder_id))
        .filter(call::Column::StartedAt.gte(to_fixed(week_start)))
        .filter(call::Column::StartedAt.lt(to_fixed(week_end)))
        .all(db)
        .await?;

    let call_attempts = week_calls.len() as u64;
    let success_calls: Vec<_> = week_calls
        .iter()
        .filter(|c| c.status == "completed")
        .collect();
    let success_count = success_calls.len() as u64;

    let durations: Vec<i64> = success_calls
        .iter()
        .filter(|c| c.ended_at.is_some())
        .map(|c| call_duration_minutes(c))
        .collect();
    let avg_minutes = if durations.is_empty() {
        0
    } else {
        durations.iter().sum::<i64>() / durations.len() as i64
    };

    Ok(WeeklyStats {
        call_attempts: CallAttemptsStats {
            count: call_attempts,
        },
        call_success_count: CallSuccessStats {
            count: success_count,
        },
        avg_duration: AvgDurationStats {
            minutes: avg_minutes,
        },
    })
}

pub async fn recent_calls(
    db: &DatabaseConnection,
    elder_id: i32,
    limit: u64,
) -> Result<Vec<RecentCallItem>, DbErr> {
    let calls = Call::find()
        .filter(call::Column::ElderId.eq(elder_id))
        .order_by_desc(call::Column::StartedAt)
        .limit(limit)
        .all(db)
        .await?;

    Ok(calls.iter().map(recent_call_item).collect())
}

pub async fn call_list_paginated(
    db: &DatabaseConnection,
    elder_id: i32,
    page: u64,
    page_size: u64,
) -> Result<(Vec<RecentCallItem>, u64), DbErr> {
    let total = Call::find()
        .filter(call::Column::ElderId.eq(elder_id))
        .count(db)
        .await?;

    let calls = Call::find()
        .filter(call::Column::ElderId.eq(elder_id))
        .order_by_desc(call::Column::StartedAt)
        .offset((page - 1) * page_size)
        .limit(page_size)
        .all(db)
        .await?;

    Ok((calls.iter().map(recent_call_item).collect(), total))
}

/// Latest completed call from today, if any. `recent` is newest-first.
pub fn today_highlight(recent: &[RecentCallItem], today: NaiveDate) -> Option<TodayHighlight> {
    let today_str = today.format("%Y.%m.%d").to_string();
    recent
        .iter()
        .find(|c| c.date == today_str && c.status == "completed")
        .map(|c| TodayHighlight {
            message: c.summary.clone(),
            call_time: c.time.clone(),
            emotion: c.emotion.clone().unwrap_or_else(|| "평온".to_string()),
            tags: c.tags.clone(),
        })
}

/// Earliest schedule occurrence strictly after `now`, scanning at most a
/// week ahead.
pub fn next_scheduled_call(
    schedules: &[call_schedule::Model],
    now: NaiveDateTime,
) -> Option<NextScheduledCall> {
    let mut upcoming: Option<NaiveDateTime> = None;

    for schedule in schedules {
        for day_offset in 0..8 {
            let target_date = now.date() + Duration::days(day_offset);
            if !schedule
                .day_of_week
                .eq_ignore_ascii_case(weekday_name(target_date.weekday()))
            {
                continue;
            }
            let candidate = NaiveDateTime::new(target_date, schedule.time);
            if candidate > now && upcoming.map_or(true, |best| candidate < best) {
                upcoming = Some(candidate);
            }
        }
    }

    upcoming.map(|next| NextScheduledCall {
        datetime: next,
        date_display: format!("{}년 {}월 {}일", next.year(), next.month(), next.day()),
        time_display: next.format("%H:%M").to_string(),
        is_today: next.date() == now.date(),
    })
}

/// Monday-through-Sunday schedule for the week starting at `week_start`.
pub fn weekly_schedule(
    schedules: &[call_schedule::Model],
    week_start: NaiveDate,
) -> Vec<WeeklyScheduleItem> {
    (0..7)
        .map(|day_offset| {
            let target_date = week_start + Duration::days(day_offset);
            let weekday_en = weekday_name(target_date.weekday());

            let mut times: Vec<String> = schedules
                .iter()
                .filter(|s| s.day_of_week.eq_ignore_ascii_case(weekday_en))
                .map(|s| s.time.format("%H:%M").to_string())
                .collect();
            times.sort();

            WeeklyScheduleItem {
                day_of_week: weekday_kr(weekday_en).to_string(),
                date: target_date.format("%Y-%m-%d").to_string(),
                date_display: format!("{}월 {}일", target_date.month(), target_date.day()),
                scheduled_times: times,
            }
        })
        .collect()
}

fn weekday_kr(weekday_en: &str) -> &'static str {
    match weekday_en {
        "Monday" => "월요일",
        "Tuesday" => "화요일",
        "Wednesday" => "수요일",
        "Thursday" => "목요일",
        "Friday" => "금요일",
        "Saturday" => "토요일",
        "Sunday" => "일요일",
        _ => "월요일",
    }
}

pub fn format_call_duration(call: &call::Model) -> String {
    match call.ended_at {
        Some(ended) => {
            let total = (ended - call.started_at).num_seconds();
            format!("{}분 {}초", total / 60, total % 60)
        }
        None => "0분 0초".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn schedule(id: i32, day: &str, h: u32, min: u32) -> call_schedule::Model {
        call_schedule::Model {
            id,
            elder_id: 1,
            day_of_week: day.to_string(),
            time: NaiveTime::from_hms_opt(h, min, 0).unwrap(),
        }
    }

    #[test]
    fn week_range_starts_monday_midnight() {
        // 2025-07-24 is a Thursday
        let (start, end) = week_range(dt(2025, 7, 24, 15, 30));
        assert_eq!(start, dt(2025, 7, 21, 0, 0));
        assert_eq!(end, dt(2025, 7, 28, 0, 0));

        // a Monday is its own week start
        let (start, _) = week_range(dt(2025, 7, 21, 0, 0));
        assert_eq!(start, dt(2025, 7, 21, 0, 0));
    }

    #[test]
    fn next_scheduled_call_picks_earliest_future_occurrence() {
        let schedules = vec![
            schedule(1, "Monday", 9, 0),
            schedule(2, "Monday", 20, 0),
            schedule(3, "Friday", 9, 0),
        ];
        // Monday 10:00: the 09:00 slot has passed, 20:00 is next
        let next = next_scheduled_call(&schedules, dt(2025, 7, 21, 10, 0)).unwrap();
        assert_eq!(next.datetime, dt(2025, 7, 21, 20, 0));
        assert!(next.is_today);
        assert_eq!(next.time_display, "20:00");
        assert_eq!(next.date_display, "2025년 7월 21일");

        // Saturday: nothing until next Monday 09:00
        let next = next_scheduled_call(&schedules, dt(2025, 7, 26, 12, 0)).unwrap();
        assert_eq!(next.datetime, dt(2025, 7, 28, 9, 0));
        assert!(!next.is_today);
    }

    #[test]
    fn next_scheduled_call_is_none_without_schedules() {
        assert!(next_scheduled_call(&[], dt(2025, 7, 21, 10, 0)).is_none());
    }

    #[test]
    fn weekly_schedule_covers_monday_through_sunday() {
        let schedules = vec![
            schedule(1, "Monday", 20, 0),
            schedule(2, "Monday", 9, 0),
            schedule(3, "Wednesday", 14, 0),
        ];
        let week = weekly_schedule(&schedules, NaiveDate::from_ymd_opt(2025, 7, 21).unwrap());

        assert_eq!(week.len(), 7);
        assert_eq!(week[0].day_of_week, "월요일");
        assert_eq!(week[0].date, "2025-07-21");
        assert_eq!(week[0].date_display, "7월 21일");
        // times come back sorted
        assert_eq!(week[0].scheduled_times, vec!["09:00", "20:00"]);
        assert_eq!(week[2].scheduled_times, vec!["14:00"]);
        assert!(week[6].scheduled_times.is_empty());
        assert_eq!(week[6].day_of_week, "일요일");
    }

    #[test]
    fn service_days_counts_from_begin_date() {
        let begin = dt(2025, 7, 1, 9, 0);
        assert_eq!(
            service_days(begin, NaiveDate::from_ymd_opt(2025, 7, 21).unwrap()),
            20
        );
    }

    #[test]
    fn today_highlight_skips_failed_calls() {
        let today = NaiveDate::from_ymd_opt(2025, 7, 21).unwrap();
        let mk = |date: &str, status: &str, summary: &str| RecentCallItem {
            id: 1,
            date: date.to_string(),
            time: "10:00".to_string(),
            duration_minutes: 5,
            summary: summary.to_string(),
            tags: vec![],
            emotion: None,
            status: status.to_string(),
        };

        let recent = vec![
            mk("2025.07.21", "failed", ""),
            mk("2025.07.21", "completed", "산책을 다녀오셨다고 합니다."),
            mk("2025.07.20", "completed", "yesterday"),
        ];
        let highlight = today_highlight(&recent, today).unwrap();
        assert_eq!(highlight.message, "산책을 다녀오셨다고 합니다.");
        assert_eq!(highlight.emotion, "평온");

        assert!(today_highlight(&[mk("2025.07.20", "completed", "x")], today).is_none());
    }
}
