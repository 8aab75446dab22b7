//! Contact numbers and email addresses, shared by learners and parents.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{contact_number, email_address};
use crate::repository;
use crate::services::{diff_ids, new_id};

#[derive(Clone, Copy, Debug)]
pub enum Owner<'a> {
    Learner(&'a str),
    Parent(&'a str),
}

impl Owner<'_> {
    fn ids(&self) -> (Option<String>, Option<String>) {
        match self {
            Owner::Learner(id) => (Some(id.to_string()), None),
            Owner::Parent(id) => (None, Some(id.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContactNumberDto {
    #[serde(default)]
    pub id: Option<String>,
    pub number: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl From<contact_number::Model> for ContactNumberDto {
    fn from(model: contact_number::Model) -> Self {
        Self {
            id: Some(model.id),
            number: model.number,
            is_primary: model.is_primary,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailAddressDto {
    #[serde(default)]
    pub id: Option<String>,
    pub email: String,
    #[serde(default)]
    pub is_primary: bool,
}

impl From<email_address::Model> for EmailAddressDto {
    fn from(model: email_address::Model) -> Self {
        Self {
            id: Some(model.id),
            email: model.email,
            is_primary: model.is_primary,
        }
    }
}

fn contact_numbers_of(owner: Owner<'_>) -> Condition {
    match owner {
        Owner::Learner(id) => Condition::all().add(contact_number::Column::LearnerId.eq(id)),
        Owner::Parent(id) => Condition::all().add(contact_number::Column::ParentId.eq(id)),
    }
}

fn email_addresses_of(owner: Owner<'_>) -> Condition {
    match owner {
        Owner::Learner(id) => Condition::all().add(email_address::Column::LearnerId.eq(id)),
        Owner::Parent(id) => Condition::all().add(email_address::Column::ParentId.eq(id)),
    }
}

pub async fn contact_numbers<C: ConnectionTrait>(
    conn: &C,
    owner: Owner<'_>,
) -> Result<Vec<ContactNumberDto>, DbErr> {
    let rows = contact_number::Entity::find()
        .filter(contact_numbers_of(owner))
        .order_by_desc(contact_number::Column::IsPrimary)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(ContactNumberDto::from).collect())
}

pub async fn email_addresses<C: ConnectionTrait>(
    conn: &C,
    owner: Owner<'_>,
) -> Result<Vec<EmailAddressDto>, DbErr> {
    let rows = email_address::Entity::find()
        .filter(email_addresses_of(owner))
        .order_by_desc(email_address::Column::IsPrimary)
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(EmailAddressDto::from).collect())
}

/// Makes the owner's stored numbers match `incoming`: rows whose id is not
/// sent are removed, known ids are updated, the rest are inserted.
pub async fn sync_contact_numbers<C: ConnectionTrait>(
    conn: &C,
    owner: Owner<'_>,
    incoming: Vec<ContactNumberDto>,
) -> Result<(), DbErr> {
    let existing = contact_number::Entity::find()
        .filter(contact_numbers_of(owner))
        .all(conn)
        .await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|dto| dto.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        contact_number::Entity::delete_many()
            .filter(contact_number::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let (learner_id, parent_id) = owner.ids();
    let mut inserts = Vec::new();
    for dto in incoming {
        match dto.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                contact_number::ActiveModel {
                    id: Set(id),
                    number: Set(dto.number),
                    is_primary: Set(dto.is_primary),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            None => inserts.push(contact_number::ActiveModel {
                id: Set(new_id()),
                learner_id: Set(learner_id.clone()),
                parent_id: Set(parent_id.clone()),
                number: Set(dto.number),
                is_primary: Set(dto.is_primary),
            }),
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}

pub async fn sync_email_addresses<C: ConnectionTrait>(
    conn: &C,
    owner: Owner<'_>,
    incoming: Vec<EmailAddressDto>,
) -> Result<(), DbErr> {
    let existing = email_address::Entity::find()
        .filter(email_addresses_of(owner))
        .all(conn)
        .await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|dto| dto.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        email_address::Entity::delete_many()
            .filter(email_address::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let (learner_id, parent_id) = owner.ids();
    let mut inserts = Vec::new();
    for dto in incoming {
        match dto.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                email_address::ActiveModel {
                    id: Set(id),
                    email: Set(dto.email),
                    is_primary: Set(dto.is_primary),
                    ..Default::default()
                }
                .update(conn)
                .await?;
            }
            None => inserts.push(email_address::ActiveModel {
                id: Set(new_id()),
                learner_id: Set(learner_id.clone()),
                parent_id: Set(parent_id.clone()),
                email: Set(dto.email),
                is_primary: Set(dto.is_primary),
            }),
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}
