use crate::apns::ApnsClient;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

fn default_title() -> String {
    "테스트 푸시".to_string()
}

fn default_body() -> String {
    "소리ai 서버에서 보낸 APNs 푸시입니다!".to_string()
}

#[derive(serde::Deserialize)]
pub struct PushRequest {
    #[serde(default = "default_title")]
    title: String,
    #[serde(default = "default_body")]
    body: String,
}

/// Operator smoke test: visible alert push to the env-configured device.
/// The APNs status travels in the body; transport failures are 502.
pub async fn send_push(
    Extension(apns): Extension<Arc<ApnsClient>>,
    Json(payload): Json<PushRequest>,
) -> Response {
    let device_token = match std::env::var("DEVICE_TOKEN") {
        Ok(t) => t,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "DEVICE_TOKEN not set"})),
            )
                .into_response()
        }
    };

    match apns
        .send_alert_push(&device_token, &payload.title, &payload.body)
        .await
    {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({"error": e}))).into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct VoipPushRequest {
    ai_call_id: Option<String>,
}

/// Operator smoke test: silent VoIP wake to the env-configured device.
pub async fn send_voip_push(
    Extension(apns): Extension<Arc<ApnsClient>>,
    Json(payload): Json<VoipPushRequest>,
) -> Response {
    let device_token = match std::env::var("VOIP_DEVICE_TOKEN") {
        Ok(t) => t,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "VOIP_DEVICE_TOKEN not set"})),
            )
                .into_response()
        }
    };

    let data = json!({"ai_call_id": payload.ai_call_id});
    match apns.send_voip_push(&device_token, data).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => (StatusCode::BAD_GATEWAY, Json(json!({"error": e}))).into_response(),
    }
}
