use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "learners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub date_of_birth: Option<Date>,
    pub school_grade_id: Option<String>,
    pub school_class: Option<String>,
    pub medical_aid_parent_id: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::school_grade::Entity",
        from = "Column::SchoolGradeId",
        to = "super::school_grade::Column::Id",
        on_update = "Cascade",
        on_delete = "SetNull"
    )]
    SchoolGrade,
    #[sea_orm(
        belongs_to = "super::parent::Entity",
        from = "Column::MedicalAidParentId",
        to = "super::parent::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    MedicalAidParent,
    #[sea_orm(has_many = "super::learner_parent::Entity")]
    Parents,
    #[sea_orm(has_many = "super::contact_number::Entity")]
    ContactNumbers,
    #[sea_orm(has_many = "super::email_address::Entity")]
    EmailAddresses,
    #[sea_orm(has_many = "super::disciplinary_incident::Entity")]
    Incidents,
}

impl Related<super::school_grade::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SchoolGrade.def()
    }
}

impl Related<super::learner_parent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Parents.def()
    }
}

impl Related<super::disciplinary_incident::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Incidents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
