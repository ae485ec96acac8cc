pub use super::call::Entity as Call;
pub use super::call_message::Entity as CallMessage;
pub use super::call_schedule::Entity as CallSchedule;
pub use super::elder::Entity as Elder;
pub use super::user::Entity as User;
