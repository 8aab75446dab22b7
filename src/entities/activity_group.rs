use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "activity_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub age_group_id: String,
    pub teacher_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::age_group::Entity",
        from = "Column::AgeGroupId",
        to = "super::age_group::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AgeGroup,
    #[sea_orm(
        belongs_to = "super::teacher::Entity",
        from = "Column::TeacherId",
        to = "super::teacher::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Teacher,
    #[sea_orm(has_many = "super::participating_activity_group::Entity")]
    Participations,
}

impl Related<super::age_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AgeGroup.def()
    }
}

impl Related<super::teacher::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Teacher.def()
    }
}

impl Related<super::participating_activity_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
