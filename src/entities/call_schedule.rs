use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// One weekly recurring call slot. Rows are written in day-of-week x
// time-of-day batches; editing an elder's schedule deletes the old rows and
// recreates the full set, so duplicates are possible and tolerated.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "call_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub elder_id: i32,
    // "Monday".."Sunday"
    pub day_of_week: String,
    // Local time of day, no timezone; the deployment clock is the reference.
    pub time: Time,
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
}

impl Related<super::elder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Elder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
