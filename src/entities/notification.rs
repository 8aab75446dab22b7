use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Denormalized side table: `entity_id` names the row this notification is
/// about without a foreign key, so owners purge these rows themselves.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed)]
    pub entity_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub recipients: Json,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
