pub mod call;
pub mod call_message;
pub mod call_schedule;
pub mod elder;
pub mod user;

pub use call::Entity as Call;
pub use call_message::Entity as CallMessage;
pub use call_schedule::Entity as CallSchedule;
pub use elder::Entity as Elder;
pub use user::Entity as User;

pub mod prelude;
