use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "disciplinary_incidents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub learner_id: String,
    pub disciplinary_action_id: String,
    pub occurred_at: DateTime,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::learner::Entity",
        from = "Column::LearnerId",
        to = "super::learner::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Learner,
    #[sea_orm(
        belongs_to = "super::disciplinary_action::Entity",
        from = "Column::DisciplinaryActionId",
        to = "super::disciplinary_action::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Action,
}

impl Related<super::learner::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Learner.def()
    }
}

impl Related<super::disciplinary_action::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Action.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
