use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "age_groups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    pub min_age: i32,
    pub max_age: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::activity_group::Entity")]
    ActivityGroups,
}

impl Related<super::activity_group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ActivityGroups.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
