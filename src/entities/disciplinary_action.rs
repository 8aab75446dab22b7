use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "disciplinary_actions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub severity_scale_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::severity_scale::Entity",
        from = "Column::SeverityScaleId",
        to = "super::severity_scale::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    SeverityScale,
    #[sea_orm(has_many = "super::disciplinary_incident::Entity")]
    Incidents,
}

impl Related<super::severity_scale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeverityScale.def()
    }
}

impl Related<super::disciplinary_incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
