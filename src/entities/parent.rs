use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "parents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub receive_notifications: bool,
    pub receive_emails: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::parent_address::Entity")]
    Addresses,
    #[sea_orm(has_many = "super::contact_number::Entity")]
    ContactNumbers,
    #[sea_orm(has_many = "super::email_address::Entity")]
    EmailAddresses,
    #[sea_orm(has_many = "super::emergency_contact::Entity")]
    EmergencyContacts,
    #[sea_orm(has_many = "super::learner_parent::Entity")]
    Learners,
    #[sea_orm(has_many = "super::parent_permission::Entity")]
    EventConsents,
}

impl Related<super::parent_address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::emergency_contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmergencyContacts.def()
    }
}

impl Related<super::learner_parent::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Learners.def()
    }
}

impl Related<super::parent_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EventConsents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
