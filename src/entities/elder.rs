use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "elders")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub age: i32,
    pub gender: String,
    pub relation: String,
    pub phone: String,
    pub residence_type: String,
    pub health_condition: String,
    pub begin_date: DateTime,
    pub end_date: Option<DateTime>,
    pub ask_meal: bool,
    pub ask_medication: bool,
    pub ask_emotion: bool,
    pub ask_special_event: bool,
    pub additional_info: Option<String>,
    // One-time code shown to the guardian; the elder's device trades it for
    // a VoIP token binding.
    #[sea_orm(unique)]
    pub invite_code: String,
    // Set exactly once by the invitation-code endpoint; a second binding
    // attempt is rejected with 409.
    pub voip_device_token: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::call_schedule::Entity")]
    CallSchedule,
    #[sea_orm(has_many = "super::call::Entity")]
    Call,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::call_schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallSchedule.def()
    }
}

impl Related<super::call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Call.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
