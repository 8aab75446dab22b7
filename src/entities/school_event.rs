use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "school_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub start_date: DateTime,
    pub end_date: DateTime,
    pub requires_consent: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participating_activity_group::Entity")]
    ParticipatingActivityGroups,
    #[sea_orm(has_many = "super::parent_permission::Entity")]
    ParentPermissions,
}

impl Related<super::participating_activity_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParticipatingActivityGroups.def()
    }
}

impl Related<super::parent_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ParentPermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
