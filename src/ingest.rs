use crate::entities::{call, call_message, elder, Elder};
use chrono::{DateTime, NaiveDateTime, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use serde_json::Value;
use std::fmt;
use tracing::debug;

/// Failures while turning an end-of-call report into rows. The validation
/// variants all occur before the first write, so none of them can leave a
/// partial record behind.
#[derive(Debug)]
pub enum IngestError {
    MissingElderId,
    InvalidElderId(String),
    UnknownElder(i32),
    InvalidTimestamp(String),
    Db(DbErr),
}

impl IngestError {
    /// True for bad-input failures, false for persistence failures.
    pub fn is_validation(&self) -> bool {
        !matches!(self, IngestError::Db(_))
    }
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::MissingElderId => {
                write!(f, "no elder_id in call metadata (checked assistantOverrides.metadata and metadata)")
            }
            IngestError::InvalidElderId(raw) => write!(f, "elder_id is not numeric: {}", raw),
            IngestError::UnknownElder(id) => write!(f, "no elder with id {}", id),
            IngestError::InvalidTimestamp(raw) => write!(f, "invalid timestamp: {}", raw),
            IngestError::Db(e) => write!(f, "database error: {}", e),
        }
    }
}

impl std::error::Error for IngestError {}

impl From<DbErr> for IngestError {
    fn from(e: DbErr) -> Self {
        IngestError::Db(e)
    }
}

// The app passes metadata through assistantOverrides, but reports produced
// by directly-configured sessions carry it at the call level. Tried in
// order, first non-empty block wins.
type MetadataSource = (&'static str, fn(&Value) -> Option<&Value>);

const METADATA_SOURCES: [MetadataSource; 2] = [
    ("call.assistantOverrides.metadata", assistant_overrides_metadata),
    ("call.metadata", call_level_metadata),
];

fn nonempty_object(v: &Value) -> Option<&Value> {
    v.as_object().filter(|o| !o.is_empty()).map(|_| v)
}

fn assistant_overrides_metadata(call_data: &Value) -> Option<&Value> {
    call_data
        .pointer("/assistantOverrides/metadata")
        .and_then(nonempty_object)
}

fn call_level_metadata(call_data: &Value) -> Option<&Value> {
    call_data.get("metadata").and_then(nonempty_object)
}

pub fn extract_elder_id(call_data: &Value) -> Result<i32, IngestError> {
    let (location, metadata) = METADATA_SOURCES
        .iter()
        .find_map(|(location, source)| source(call_data).map(|m| (*location, m)))
        .ok_or(IngestError::MissingElderId)?;
    debug!("call metadata found at {}", location);

    let raw = metadata
        .get("elder_id")
        .ok_or(IngestError::MissingElderId)?;

    match raw {
        Value::Number(n) => n
            .as_i64()
            .map(|v| v as i32)
            .ok_or_else(|| IngestError::InvalidElderId(raw.to_string())),
        Value::String(s) => s
            .parse::<i32>()
            .map_err(|_| IngestError::InvalidElderId(s.clone())),
        other => Err(IngestError::InvalidElderId(other.to_string())),
    }
}

/// Maps the platform's session-end reason onto the coarse call status.
/// Anything but a clean hang-up by either side counts as failed.
pub fn call_status(ended_reason: Option<&str>) -> &'static str {
    match ended_reason {
        Some("customer-ended-call") | Some("assistant-ended-call") => "completed",
        _ => "failed",
    }
}

pub fn parse_timestamp(raw: &str) -> Result<sea_orm::prelude::DateTimeWithTimeZone, IngestError> {
    DateTime::parse_from_rfc3339(raw).map_err(|_| IngestError::InvalidTimestamp(raw.to_string()))
}

pub struct ParsedMessage {
    pub role: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
}

/// Keeps only user/bot turns (bot becomes assistant), in report order.
/// Per-message timestamps are epoch milliseconds; a missing one falls back
/// to the session start.
pub fn collect_messages(raw_messages: &[Value], started_at: NaiveDateTime) -> Vec<ParsedMessage> {
    raw_messages
        .iter()
        .filter_map(|msg| {
            let role = match msg.get("role").and_then(|r| r.as_str()) {
                Some("user") => "user",
                Some("bot") => "assistant",
                _ => return None,
            };
            let timestamp = msg
                .get("time")
                .and_then(|t| t.as_f64())
                .and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64))
                .map(|dt| dt.naive_utc())
                .unwrap_or(started_at);
            Some(ParsedMessage {
                role: role.to_string(),
                message: msg
                    .get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or_default()
                    .to_string(),
                timestamp,
            })
        })
        .collect()
}

/// Parses an end-of-call report and persists one Call plus its CallMessages
/// in a single transaction. All extraction and validation happens before
/// the transaction opens, so a returned error means nothing was written.
pub async fn save_call_from_report(
    db: &DatabaseConnection,
    payload: &Value,
) -> Result<call::Model, IngestError> {
    let message = payload.get("message").unwrap_or(&Value::Null);
    let call_data = message.get("call").unwrap_or(&Value::Null);

    let elder_id = extract_elder_id(call_data)?;

    let elder: elder::Model = Elder::find_by_id(elder_id)
        .one(db)
        .await?
        .ok_or(IngestError::UnknownElder(elder_id))?;

    let vapi_call_id = call_data
        .get("id")
        .and_then(|v| v.as_str())
        .map(String::from);

    let started_at = match message.get("startedAt").and_then(|v| v.as_str()) {
        Some(raw) => parse_timestamp(raw)?,
        None => Utc::now().fixed_offset(),
    };
    let ended_at = message
        .get("endedAt")
        .and_then(|v| v.as_str())
        .map(parse_timestamp)
        .transpose()?;
    if let Some(ended) = ended_at {
        if ended < started_at {
            return Err(IngestError::InvalidTimestamp(format!(
                "endedAt {} precedes startedAt {}",
                ended, started_at
            )));
        }
    }

    let status = call_status(message.get("endedReason").and_then(|v| v.as_str()));

    let analysis = message.get("analysis").unwrap_or(&Value::Null);
    let summary = analysis
        .get("summary")
        .and_then(|v| v.as_str())
        .map(String::from);
    let structured = analysis.get("structuredData").unwrap_or(&Value::Null);
    let emotion = structured
        .get("emotion")
        .and_then(|v| v.as_str())
        .map(String::from);
    let tags = structured.get("tags").filter(|v| v.is_array()).cloned();

    let raw_messages = message
        .get("messages")
        .and_then(|v| v.as_array())
        .map(|v| v.as_slice())
        .unwrap_or(&[]);
    let parsed_messages = collect_messages(raw_messages, started_at.naive_utc());

    let now = Utc::now().naive_utc();
    let txn = db.begin().await?;

    let saved = call::ActiveModel {
        vapi_call_id: Set(vapi_call_id),
        elder_id: Set(elder.id),
        user_id: Set(elder.user_id),
        started_at: Set(started_at),
        ended_at: Set(ended_at),
        status: Set(status.to_string()),
        summary: Set(summary),
        emotion: Set(emotion),
        tags: Set(tags),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for parsed in &parsed_messages {
        call_message::ActiveModel {
            call_id: Set(saved.id),
            role: Set(parsed.role.clone()),
            message: Set(parsed.message.clone()),
            timestamp: Set(parsed.timestamp),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
    }

    txn.commit().await?;

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overrides_metadata_wins_over_call_metadata() {
        let call_data = json!({
            "assistantOverrides": {"metadata": {"elder_id": "3"}},
            "metadata": {"elder_id": "9"}
        });
        assert_eq!(extract_elder_id(&call_data).unwrap(), 3);
    }

    #[test]
    fn empty_overrides_block_falls_back_to_call_metadata() {
        let call_data = json!({
            "assistantOverrides": {"metadata": {}},
            "metadata": {"elder_id": 9}
        });
        assert_eq!(extract_elder_id(&call_data).unwrap(), 9);
    }

    #[test]
    fn numeric_and_string_elder_ids_both_accepted() {
        let as_number = json!({"metadata": {"elder_id": 42}});
        let as_string = json!({"metadata": {"elder_id": "42"}});
        assert_eq!(extract_elder_id(&as_number).unwrap(), 42);
        assert_eq!(extract_elder_id(&as_string).unwrap(), 42);
    }

    #[test]
    fn missing_metadata_everywhere_is_a_validation_error() {
        let call_data = json!({"id": "abc"});
        let err = extract_elder_id(&call_data).unwrap_err();
        assert!(matches!(err, IngestError::MissingElderId));
        assert!(err.is_validation());
    }

    #[test]
    fn non_numeric_elder_id_is_rejected() {
        let call_data = json!({"metadata": {"elder_id": "not-a-number"}});
        assert!(matches!(
            extract_elder_id(&call_data),
            Err(IngestError::InvalidElderId(_))
        ));
    }

    #[test]
    fn ended_reason_maps_to_status() {
        assert_eq!(call_status(Some("customer-ended-call")), "completed");
        assert_eq!(call_status(Some("assistant-ended-call")), "completed");
        assert_eq!(call_status(Some("silence-timed-out")), "failed");
        assert_eq!(call_status(None), "failed");
    }

    #[test]
    fn zulu_suffix_parses_as_utc() {
        let parsed = parse_timestamp("2025-07-21T09:00:12Z").unwrap();
        assert_eq!(parsed.timestamp(), 1753088412);
        assert!(parse_timestamp("yesterday at nine").is_err());
    }

    #[test]
    fn system_messages_are_dropped_and_bot_becomes_assistant() {
        let started_at = DateTime::<Utc>::from_timestamp_millis(1_750_000_000_000)
            .unwrap()
            .naive_utc();
        let raw = vec![
            json!({"role": "system", "message": "prompt", "time": 1_750_000_000_000u64}),
            json!({"role": "bot", "message": "여보세요, 안녕하세요!", "time": 1_750_000_002_000u64}),
            json!({"role": "user", "message": "네, 안녕하세요.", "time": 1_750_000_005_000u64}),
        ];
        let parsed = collect_messages(&raw, started_at);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].role, "assistant");
        assert_eq!(parsed[1].role, "user");
        assert!(parsed[0].timestamp < parsed[1].timestamp);
    }

    #[test]
    fn missing_message_time_falls_back_to_session_start() {
        let started_at = DateTime::<Utc>::from_timestamp_millis(1_750_000_000_000)
            .unwrap()
            .naive_utc();
        let raw = vec![json!({"role": "user", "message": "안녕하세요"})];
        let parsed = collect_messages(&raw, started_at);
        assert_eq!(parsed[0].timestamp, started_at);
    }

    #[test]
    fn sorting_by_timestamp_restores_conversational_order() {
        let started_at = DateTime::<Utc>::from_timestamp_millis(1_750_000_000_000)
            .unwrap()
            .naive_utc();
        // report order scrambled relative to utterance times
        let raw = vec![
            json!({"role": "user", "message": "second", "time": 1_750_000_004_000u64}),
            json!({"role": "bot", "message": "first", "time": 1_750_000_001_000u64}),
            json!({"role": "user", "message": "third", "time": 1_750_000_009_000u64}),
        ];
        let mut parsed = collect_messages(&raw, started_at);
        parsed.sort_by_key(|m| m.timestamp);
        let order: Vec<&str> = parsed.iter().map(|m| m.message.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn report_without_metadata_is_rejected_before_any_write() {
        // mock connection with no scripted results: any query or statement
        // would error, so a clean MissingElderId proves nothing was touched
        let db = sea_orm::MockDatabase::new(sea_orm::DatabaseBackend::Postgres).into_connection();
        let payload = json!({
            "message": {
                "type": "end-of-call-report",
                "call": {"id": "vapi-123"},
                "endedReason": "customer-ended-call",
                "messages": []
            }
        });
        let err = save_call_from_report(&db, &payload).await.unwrap_err();
        assert!(matches!(err, IngestError::MissingElderId));
    }

    #[test]
    fn empty_message_list_yields_no_rows() {
        let started_at = DateTime::<Utc>::from_timestamp_millis(1_750_000_000_000)
            .unwrap()
            .naive_utc();
        assert!(collect_messages(&[], started_at).is_empty());
    }
}
