use axum::{
    routing::{get, post, put},
    Extension, Router,
};
use sea_orm::{Database, DatabaseConnection};
use sori_server::apns::ApnsClient;
use sori_server::auth_codes::InMemoryCodeStore;
use sori_server::notifications::EmailNotifier;
use sori_server::scheduler::CallScheduler;
use sori_server::{api, migrator};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    sori_server::telemetry::init_telemetry("sori-server");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Database Connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    use sea_orm_migration::MigratorTrait;
    migrator::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // Initialize Metrics
    sori_server::metrics::init_metrics(&db).await;

    // APNs client (required: the scheduler cannot wake devices without it)
    let apns = Arc::new(ApnsClient::from_env().expect("APNs credentials must be configured"));

    let notifier = EmailNotifier::new();
    let code_store: api::auth::SharedCodeStore = Arc::new(InMemoryCodeStore::new());

    // One scheduler per deployment; running a second instance would
    // double-fire every scheduled call.
    let scheduler = Arc::new(CallScheduler::new(db.clone(), apns.clone()));
    scheduler.start();

    let app = app(
        db,
        apns,
        notifier,
        code_store,
        prometheus_layer,
        metric_handle,
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    scheduler.stop();
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for shutdown signal");
    tracing::info!("shutdown signal received");
}

async fn health_check() -> &'static str {
    "OK"
}

fn app(
    db: DatabaseConnection,
    apns: Arc<ApnsClient>,
    notifier: EmailNotifier,
    code_store: api::auth::SharedCodeStore,
    prometheus_layer: axum_prometheus::PrometheusMetricLayer<'static>,
    metric_handle: metrics_exporter_prometheus::PrometheusHandle,
) -> Router {
    let auth_routes = Router::new()
        .route("/auth/code", post(api::auth::request_code))
        .route("/auth/verify", post(api::auth::verify_code));

    let elder_routes = Router::new()
        .route(
            "/users/:user_id/elders",
            get(api::elders::list_user_elders).post(api::elders::create_elder),
        )
        .route(
            "/users/:user_id/elders/:elder_id",
            get(api::elders::get_elder),
        )
        .route(
            "/users/:user_id/elders/:elder_id/schedules",
            put(api::elders::update_schedules),
        )
        .route(
            "/users/:user_id/elders/:elder_id/regenerate-invite-code",
            post(api::elders::regenerate_invite_code),
        );

    let elder_app_routes = Router::new()
        .route(
            "/invitation-code",
            post(api::elder_app::register_invitation_code),
        )
        .route(
            "/assistant-config/:elder_id",
            get(api::elder_app::get_assistant_config),
        );

    let dashboard_routes = Router::new()
        .route("/dashboard/:elder_id", get(api::dashboard::get_dashboard))
        .route(
            "/dashboard/:elder_id/call-list",
            get(api::dashboard::get_call_list),
        )
        .route(
            "/dashboard/call-detail/:call_id",
            get(api::dashboard::get_call_detail),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes)
        .merge(elder_routes)
        .merge(elder_app_routes)
        .merge(dashboard_routes)
        .route("/webhook", post(api::webhook::vapi_webhook))
        .route("/push", post(api::push::send_push))
        .route("/push/voip", post(api::push::send_voip_push))
        .layer(Extension(db))
        .layer(Extension(apns))
        .layer(Extension(notifier))
        .layer(Extension(code_store))
        .layer(tower_cookies::CookieManagerLayer::new())
        .layer(prometheus_layer)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<axum::body::Body>| {
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched| matched.as_str());

                    let span_name = if let Some(path) = matched_path {
                        format!("{} {}", request.method(), path)
                    } else {
                        format!("{} {}", request.method(), request.uri().path())
                    };

                    tracing::info_span!(
                        "request",
                        "otel.name" = span_name,
                        method = ?request.method(),
                        uri = ?request.uri(),
                    )
                },
            ),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(
                    std::env::var("DASHBOARD_ORIGIN")
                        .unwrap_or_else(|_| "http://localhost:3000".to_string())
                        .parse::<axum::http::HeaderValue>()
                        .unwrap(),
                )
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::PUT,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE])
                .allow_credentials(true),
        )
        .route("/metrics", get(|| async move { metric_handle.render() }))
}
