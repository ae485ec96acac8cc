pub mod api;
pub mod apns;
pub mod assistant;
pub mod auth_codes;
pub mod dashboard;
pub mod entities;
pub mod ingest;
pub mod metrics;
pub mod migrator;
pub mod notifications;
pub mod scheduler;
pub mod telemetry;

pub use sea_orm;
