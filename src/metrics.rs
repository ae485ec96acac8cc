use crate::entities::{call, elder, user};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

pub async fn init_metrics(db: &DatabaseConnection) {
    let user_count = user::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("sori_users_total").set(user_count as f64);

    let elder_count = elder::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("sori_elders_total").set(elder_count as f64);

    let call_count = call::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("sori_calls_total").set(call_count as f64);

    tracing::info!(
        "Initialized metrics: Users={}, Elders={}, Calls={}",
        user_count,
        elder_count,
        call_count
    );
}

pub fn increment_users_registered() {
    metrics::counter!("sori_users_registered_total").increment(1);
    metrics::gauge!("sori_users_total").increment(1.0);
}

pub fn increment_elders_registered() {
    metrics::counter!("sori_elders_registered_total").increment(1);
    metrics::gauge!("sori_elders_total").increment(1.0);
}

pub fn increment_calls_saved(status: &str) {
    metrics::counter!("sori_calls_saved_total", "status" => status.to_string()).increment(1);
    metrics::gauge!("sori_calls_total").increment(1.0);
}

pub fn increment_webhook_events(event_type: &str) {
    metrics::counter!("sori_webhook_events_total", "type" => event_type.to_string()).increment(1);
}

pub fn increment_auth_emails(result: &str) {
    metrics::counter!("sori_auth_emails_total", "result" => result.to_string()).increment(1);
}

pub fn increment_devices_bound() {
    metrics::counter!("sori_devices_bound_total").increment(1);
}
