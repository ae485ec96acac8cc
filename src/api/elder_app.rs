use crate::assistant::build_assistant_config;
use crate::entities::elder;
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set,
};
use serde_json::json;
use tracing::info;

#[derive(serde::Deserialize)]
pub struct BindDeviceRequest {
    invite_code: String,
    voip_device_token: String,
}

/// Trades a one-time invite code for a device binding. A code whose elder
/// already has a token is rejected with 409; tokens are never silently
/// overwritten.
pub async fn register_invitation_code(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<BindDeviceRequest>,
) -> Response {
    let elder = match elder::Entity::find()
        .filter(elder::Column::InviteCode.eq(payload.invite_code.clone()))
        .one(&db)
        .await
    {
        Ok(Some(e)) => e,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "Invalid invitation code"})),
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

    if elder.voip_device_token.is_some() {
        return (
            StatusCode::CONFLICT,
            Json(json!({"error": "A device is already registered for this invitation code"})),
        )
            .into_response();
    }

    let elder_id = elder.id;
    let elder_name = elder.name.clone();

    let mut active = elder.into_active_model();
    active.voip_device_token = Set(Some(payload.voip_device_token));
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(_) => {
            info!("device bound for elder {} ({})", elder_id, elder_name);
            crate::metrics::increment_devices_bound();
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "elder_id": elder_id,
                    "elder_name": elder_name,
                    "message": "Device registered successfully"
                })),
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

/// Called by the woken iOS app to fetch the full voice session
/// configuration for this elder.
pub async fn get_assistant_config(
    Extension(db): Extension<DatabaseConnection>,
    Path(elder_id): Path<i32>,
) -> Response {
    let elder = match elder::Entity::find_by_id(elder_id).one(&db).await {
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

    let server_url = std::env::var("SERVER_URL")
        .unwrap_or_else(|_| "http://localhost:8000/webhook".to_string());

    (
        StatusCode::OK,
        Json(build_assistant_config(&elder, &server_url)),
    )
        .into_response()
}
