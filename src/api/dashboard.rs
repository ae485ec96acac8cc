use crate::dashboard::{
    call_list_paginated, format_call_duration, next_scheduled_call, recent_calls, service_days,
    tags_to_vec, today_highlight, week_range, weekly_schedule, weekly_stats, CallDetailResponse,
    CallListResponse, CallMessageItem, DashboardResponse, ElderBasicInfo, CALL_LIST_PAGE_SIZE,
    RECENT_CALLS_LIMIT,
};
use crate::entities::{call_message, call_schedule, elder, Call, CallMessage, CallSchedule, Elder};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use serde_json::json;

async fn build_dashboard(
    db: &DatabaseConnection,
    elder: elder::Model,
) -> Result<DashboardResponse, DbErr> {
    let now = chrono::Local::now().naive_local();
    let (week_start, week_end) = week_range(now);

    let stats = weekly_stats(db, elder.id, week_start, week_end).await?;
    let recent = recent_calls(db, elder.id, RECENT_CALLS_LIMIT).await?;
    let highlight = today_highlight(&recent, now.date());

    let schedules = CallSchedule::find()
        .filter(call_schedule::Column::ElderId.eq(elder.id))
        .all(db)
        .await?;
    let next_call = next_scheduled_call(&schedules, now);
    let this_week = weekly_schedule(&schedules, week_start.date());

    Ok(DashboardResponse {
        elder: ElderBasicInfo {
            id: elder.id,
            name: elder.name,
            relation: elder.relation,
            service_days: service_days(elder.begin_date, now.date()),
        },
        today_highlight: highlight,
        weekly_stats: stats,
        recent_calls: recent,
        next_scheduled_call: next_call,
        this_week_schedule: this_week,
    })
}

/// Everything the guardian web dashboard shows for one elder.
pub async fn get_dashboard(
    Extension(db): Extension<DatabaseConnection>,
    Path(elder_id): Path<i32>,
) -> Response {
    let elder = match Elder::find_by_id(elder_id).one(&db).await {
        Ok(Some(e)) => e,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Elder not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    match build_dashboard(&db, elder).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct CallListParams {
    page: Option<u64>,
}

pub async fn get_call_list(
    Extension(db): Extension<DatabaseConnection>,
    Path(elder_id): Path<i32>,
    Query(params): Query<CallListParams>,
) -> Response {
    match Elder::find_by_id(elder_id).one(&db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Elder not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    }

    let page = params.page.unwrap_or(1).max(1);
    match call_list_paginated(&db, elder_id, page, CALL_LIST_PAGE_SIZE).await {
        Ok((items, total)) => {
            let total_pages = if total > 0 {
                (total + CALL_LIST_PAGE_SIZE - 1) / CALL_LIST_PAGE_SIZE
            } else {
                1
            };
            (
                StatusCode::OK,
                Json(CallListResponse {
                    items,
                    total,
                    page,
                    page_size: CALL_LIST_PAGE_SIZE,
                    total_pages,
                }),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

/// Full detail for one call: header fields plus the transcript re-sorted by
/// utterance time.
pub async fn get_call_detail(
    Extension(db): Extension<DatabaseConnection>,
    Path(call_id): Path<i32>,
) -> Response {
    let call = match Call::find_by_id(call_id).one(&db).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Call not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let elder_name = match Elder::find_by_id(call.elder_id).one(&db).await {
        Ok(Some(e)) => e.name,
        Ok(None) => "알 수 없음".to_string(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let mut messages = match CallMessage::find()
        .filter(call_message::Column::CallId.eq(call.id))
        .all(&db)
        .await
    {
        Ok(m) => m,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };
    // report order is not chronological
    messages.sort_by_key(|m| m.timestamp);

    let started = call.started_at.naive_local();
    let detail = CallDetailResponse {
        id: call.id,
        elder_name,
        date: started.format("%Y년 %m월 %d일").to_string(),
        time: started.format("%I:%M %p").to_string(),
        duration: format_call_duration(&call),
        status: call.status.clone(),
        emotion: call.emotion.clone(),
        summary: call.summary.clone(),
        tags: tags_to_vec(&call.tags),
        messages: messages
            .into_iter()
            .map(|m| CallMessageItem {
                role: m.role,
                message: m.message,
                timestamp: m.timestamp,
            })
            .collect(),
    };

    (StatusCode::OK, Json(detail)).into_response()
}
