pub mod email;
pub mod templates;

pub use email::EmailNotifier;
pub use templates::NotificationTemplates;
