use crate::auth_codes::generate_invite_code;
use crate::entities::{call_schedule, elder, CallSchedule, User};
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{NaiveDateTime, NaiveTime};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde_json::json;

fn default_true() -> bool {
    true
}

#[derive(serde::Deserialize)]
pub struct CreateElderRequest {
    name: String,
    age: i32,
    gender: String,
    relation: String,
    phone: String,
    residence_type: String,
    health_condition: String,
    begin_date: NaiveDateTime,
    end_date: Option<NaiveDateTime>,
    #[serde(default = "default_true")]
    ask_meal: bool,
    #[serde(default = "default_true")]
    ask_medication: bool,
    #[serde(default = "default_true")]
    ask_emotion: bool,
    #[serde(default = "default_true")]
    ask_special_event: bool,
    additional_info: Option<String>,
    call_weekdays: Vec<String>,
    call_times: Vec<NaiveTime>,
}

// Elder row plus the weekday x time cross product of schedule rows, all in
// one transaction.
async fn insert_elder_with_schedules(
    db: &DatabaseConnection,
    user_id: i32,
    payload: CreateElderRequest,
) -> Result<elder::Model, DbErr> {
    let now = chrono::Utc::now().naive_utc();
    let txn = db.begin().await?;

    let new_elder = elder::ActiveModel {
        user_id: Set(user_id),
        name: Set(payload.name),
        age: Set(payload.age),
        gender: Set(payload.gender),
        relation: Set(payload.relation),
        phone: Set(payload.phone),
        residence_type: Set(payload.residence_type),
        health_condition: Set(payload.health_condition),
        begin_date: Set(payload.begin_date),
        end_date: Set(payload.end_date),
        ask_meal: Set(payload.ask_meal),
        ask_medication: Set(payload.ask_medication),
        ask_emotion: Set(payload.ask_emotion),
        ask_special_event: Set(payload.ask_special_event),
        additional_info: Set(payload.additional_info),
        invite_code: Set(generate_invite_code()),
        voip_device_token: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for weekday in &payload.call_weekdays {
        for call_time in &payload.call_times {
            call_schedule::ActiveModel {
                elder_id: Set(new_elder.id),
                day_of_week: Set(weekday.clone()),
                time: Set(*call_time),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;
    Ok(new_elder)
}

pub async fn create_elder(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
    Json(payload): Json<CreateElderRequest>,
) -> Response {
    match User::find_by_id(user_id).one(&db).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "User not found"})),
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

    match insert_elder_with_schedules(&db, user_id, payload).await {
        Ok(elder) => {
            crate::metrics::increment_elders_registered();
            (StatusCode::CREATED, Json(elder)).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn list_user_elders(
    Extension(db): Extension<DatabaseConnection>,
    Path(user_id): Path<i32>,
) -> Response {
    match elder::Entity::find()
        .filter(elder::Column::UserId.eq(user_id))
        .all(&db)
        .await
    {
        Ok(elders) => (StatusCode::OK, Json(elders)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

// Loads the elder and enforces that the path user owns it.
async fn find_owned_elder(
    db: &DatabaseConnection,
    user_id: i32,
    elder_id: i32,
) -> Result<elder::Model, Response> {
    match elder::Entity::find_by_id(elder_id).one(db).await {
        Ok(Some(e)) if e.user_id == user_id => Ok(e),
        Ok(Some(_)) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Access denied"})),
        )
            .into_response()),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(json!({"error": "Elder not found"})),
        )
            .into_response()),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response()),
    }
}

pub async fn get_elder(
    Extension(db): Extension<DatabaseConnection>,
    Path((user_id, elder_id)): Path<(i32, i32)>,
) -> Response {
    match find_owned_elder(&db, user_id, elder_id).await {
        Ok(elder) => (StatusCode::OK, Json(elder)).into_response(),
        Err(resp) => resp,
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateSchedulesRequest {
    call_weekdays: Vec<String>,
    call_times: Vec<NaiveTime>,
}

async fn replace_schedules(
    db: &DatabaseConnection,
    elder_id: i32,
    payload: UpdateSchedulesRequest,
) -> Result<Vec<call_schedule::Model>, DbErr> {
    let txn = db.begin().await?;

    // full replace: drop the old set, recreate the new cross product
    CallSchedule::delete_many()
        .filter(call_schedule::Column::ElderId.eq(elder_id))
        .exec(&txn)
        .await?;

    for weekday in &payload.call_weekdays {
        for call_time in &payload.call_times {
            call_schedule::ActiveModel {
                elder_id: Set(elder_id),
                day_of_week: Set(weekday.clone()),
                time: Set(*call_time),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
    }

    txn.commit().await?;

    CallSchedule::find()
        .filter(call_schedule::Column::ElderId.eq(elder_id))
        .order_by_asc(call_schedule::Column::DayOfWeek)
        .order_by_asc(call_schedule::Column::Time)
        .all(db)
        .await
}

pub async fn update_schedules(
    Extension(db): Extension<DatabaseConnection>,
    Path((user_id, elder_id)): Path<(i32, i32)>,
    Json(payload): Json<UpdateSchedulesRequest>,
) -> Response {
    if let Err(resp) = find_owned_elder(&db, user_id, elder_id).await {
        return resp;
    }

    match replace_schedules(&db, elder_id, payload).await {
        Ok(schedules) => (StatusCode::OK, Json(schedules)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn regenerate_invite_code(
    Extension(db): Extension<DatabaseConnection>,
    Path((user_id, elder_id)): Path<(i32, i32)>,
) -> Response {
    let elder = match find_owned_elder(&db, user_id, elder_id).await {
        Ok(e) => e,
        Err(resp) => return resp,
    };

    let mut active = elder.into_active_model();
    active.invite_code = Set(generate_invite_code());
    active.updated_at = Set(chrono::Utc::now().naive_utc());

    match active.update(&db).await {
        Ok(elder) => (StatusCode::OK, Json(elder)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
