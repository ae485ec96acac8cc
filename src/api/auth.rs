use crate::auth_codes::{generate_auth_code, CodeStore, CODE_TTL};
use crate::entities::user;
use crate::notifications::EmailNotifier;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::json;
use std::sync::Arc;
use tower_cookies::{Cookie, Cookies};
use tracing::info;

pub type SharedCodeStore = Arc<dyn CodeStore>;

pub const SESSION_COOKIE: &str = "sori_user";

#[derive(serde::Deserialize)]
pub struct CodeRequest {
    email: String,
}

/// Emails a 6-digit sign-in code, valid for 5 minutes. Requesting again
/// invalidates the previous code.
pub async fn request_code(
    Extension(db): Extension<DatabaseConnection>,
    Extension(code_store): Extension<SharedCodeStore>,
    Extension(notifier): Extension<EmailNotifier>,
    Json(payload): Json<CodeRequest>,
) -> Response {
    let existing = match user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&db)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };
    if existing.is_some() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Email is already registered"})),
        )
            .into_response();
    }

    let code = generate_auth_code();
    code_store.put(&payload.email, code.clone(), CODE_TTL).await;

    if let Err(e) = notifier.send_auth_code(&payload.email, &code).await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("Failed to send verification email: {}", e)})),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(json!({"success": true, "message": "Verification code sent"})),
    )
        .into_response()
}

#[derive(serde::Deserialize)]
pub struct VerifyRequest {
    email: String,
    code: String,
}

/// Verifies the emailed code, creating the account on first success. A
/// rejected code is not an HTTP error; the reason comes back in the body.
pub async fn verify_code(
    Extension(db): Extension<DatabaseConnection>,
    Extension(code_store): Extension<SharedCodeStore>,
    cookies: Cookies,
    Json(payload): Json<VerifyRequest>,
) -> Response {
    if let Err(e) = code_store.verify(&payload.email, &payload.code).await {
        return (
            StatusCode::OK,
            Json(json!({"success": false, "message": e.to_string(), "user": null})),
        )
            .into_response();
    }

    let found = match user::Entity::find()
        .filter(user::Column::Email.eq(payload.email.clone()))
        .one(&db)
        .await
    {
        Ok(u) => u,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let user = match found {
        Some(u) => {
            info!("existing user authenticated: {} (id={})", u.email, u.id);
            u
        }
        None => {
            let now = chrono::Utc::now().naive_utc();
            let new_user = user::ActiveModel {
                email: Set(payload.email.clone()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            match new_user.insert(&db).await {
                Ok(u) => {
                    info!("new user created: {} (id={})", u.email, u.id);
                    crate::metrics::increment_users_registered();
                    u
                }
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({"error": e.to_string()})),
                    )
                        .into_response()
                }
            }
        }
    };

    let mut cookie = Cookie::new(SESSION_COOKIE, user.id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.add(cookie);

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Verification succeeded",
            "user": {"id": user.id, "email": user.email, "created_at": user.created_at}
        })),
    )
        .into_response()
}
