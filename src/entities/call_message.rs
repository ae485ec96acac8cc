use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// One transcript turn. Rows are inserted in report order, which is not
// guaranteed chronological; presentation must re-sort by timestamp.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "call_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub call_id: i32,
    // user or assistant; other roles are dropped at ingestion
    pub role: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub timestamp: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::call::Entity",
        from = "Column::CallId",
        to = "super::call::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Call,
}

impl Related<super::call::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Call.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
