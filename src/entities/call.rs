use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "calls")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    // Session id assigned by the voice platform; absent until its
    // end-of-call report arrives, which in this design is also the moment
    // the row is created.
    #[sea_orm(unique, nullable)]
    pub vapi_call_id: Option<String>,
    pub elder_id: i32,
    pub user_id: i32,
    pub started_at: DateTimeWithTimeZone,
    pub ended_at: Option<DateTimeWithTimeZone>,
    // completed, failed, no_answer, busy
    pub status: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    pub emotion: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub tags: Option<serde_json::Value>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::elder::Entity",
        from = "Column::ElderId",
        to = "super::elder::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Elder,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::call_message::Entity")]
    CallMessage,
}

impl Related<super::elder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Elder.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::call_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CallMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
