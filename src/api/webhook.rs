use crate::ingest::save_call_from_report;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Inbound events from the voice platform. The platform treats any non-200
/// as undeliverable, so this handler acknowledges everything and keeps
/// failures on our side of the fence (logs + archived payload).
pub async fn vapi_webhook(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<Value>,
) -> Response {
    let message = payload.get("message").unwrap_or(&Value::Null);
    let message_type = message
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("unknown")
        .to_string();

    crate::metrics::increment_webhook_events(&message_type);
    archive_payload(&message_type, &payload).await;

    match message_type.as_str() {
        "status-update" => {
            info!(
                "webhook status-update: call={:?} status={:?}",
                message.pointer("/call/id").and_then(|v| v.as_str()),
                message.get("status").and_then(|v| v.as_str()),
            );
        }
        "transcript" => {
            debug!(
                "webhook transcript: role={:?}",
                message.get("role").and_then(|v| v.as_str())
            );
        }
        "end-of-call-report" => match save_call_from_report(&db, &payload).await {
            Ok(call) => {
                info!(
                    "saved call {} (vapi_call_id={:?}, elder={}, status={})",
                    call.id, call.vapi_call_id, call.elder_id, call.status
                );
                crate::metrics::increment_calls_saved(&call.status);
            }
            Err(e) if e.is_validation() => {
                // nothing was written; the archived payload is the only copy
                warn!("discarding end-of-call report: {}", e);
            }
            Err(e) => {
                error!("failed to persist end-of-call report: {}", e);
            }
        },
        other => {
            info!("unhandled webhook type: {}", other);
        }
    }

    (StatusCode::OK, Json(json!({"ok": true}))).into_response()
}

// Every webhook body lands on disk as well, the durability fallback for
// reports the pipeline rejects.
async fn archive_payload(message_type: &str, payload: &Value) {
    let dir = std::env::var("WEBHOOK_LOG_DIR").unwrap_or_else(|_| "./data/webhook_logs".to_string());
    if let Err(e) = tokio::fs::create_dir_all(&dir).await {
        error!("failed to create webhook log dir {}: {}", dir, e);
        return;
    }

    let filename = format!(
        "{}_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S_%f"),
        message_type
    );
    let path = std::path::Path::new(&dir).join(filename);

    match serde_json::to_vec_pretty(payload) {
        Ok(bytes) => {
            if let Err(e) = tokio::fs::write(&path, bytes).await {
                error!("failed to archive webhook payload: {}", e);
            }
        }
        Err(e) => error!("failed to serialize webhook payload: {}", e),
    }
}
