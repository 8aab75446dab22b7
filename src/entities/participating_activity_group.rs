use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "participating_activity_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub event_id: String,
    pub activity_group_id: String,
}

// Removed explicitly when either side is deleted.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_event::Entity",
        from = "Column::EventId",
        to = "super::school_event::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Event,
    #[sea_orm(
        belongs_to = "super::activity_group::Entity",
        from = "Column::ActivityGroupId",
        to = "super::activity_group::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    ActivityGroup,
}

impl Related<super::school_event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::activity_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityGroup.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
