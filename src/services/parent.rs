use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Order, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{emergency_contact, learner, learner_parent, parent, parent_address};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::contact::{self, ContactNumberDto, EmailAddressDto, Owner};
use crate::services::{diff_ids, id_or_new, new_id, now, Checks};
use crate::specification::PagedSpec;

const LABEL: &str = "Parent";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentAddressDto {
    #[serde(default)]
    pub id: Option<String>,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

impl From<parent_address::Model> for ParentAddressDto {
    fn from(model: parent_address::Model) -> Self {
        Self {
            id: Some(model.id),
            line1: model.line1,
            line2: model.line2,
            city: model.city,
            postal_code: model.postal_code,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmergencyContactDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub relationship: Option<String>,
    pub contact_number: String,
}

impl From<emergency_contact::Model> for EmergencyContactDto {
    fn from(model: emergency_contact::Model) -> Self {
        Self {
            id: Some(model.id),
            name: model.name,
            relationship: model.relationship,
            contact_number: model.contact_number,
        }
    }
}

/// List row for paged parent queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentSummaryDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl From<parent::Model> for ParentSummaryDto {
    fn from(model: parent::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            email: model.email,
        }
    }
}

/// The full parent aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub receive_notifications: bool,
    pub receive_emails: bool,
    pub addresses: Vec<ParentAddressDto>,
    pub emergency_contacts: Vec<EmergencyContactDto>,
    pub contact_numbers: Vec<ContactNumberDto>,
    pub email_addresses: Vec<EmailAddressDto>,
    pub learner_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub receive_notifications: Option<bool>,
    pub receive_emails: Option<bool>,
    pub addresses: Option<Vec<ParentAddressDto>>,
    pub emergency_contacts: Option<Vec<EmergencyContactDto>>,
    pub contact_numbers: Option<Vec<ContactNumberDto>>,
    pub email_addresses: Option<Vec<EmailAddressDto>>,
}

/// A learner linked to a parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ChildDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub school_grade_id: Option<String>,
    pub school_class: Option<String>,
}

impl From<learner::Model> for ChildDto {
    fn from(model: learner::Model) -> Self {
        Self {
            id: model.id,
            first_name: model.first_name,
            last_name: model.last_name,
            school_grade_id: model.school_grade_id,
            school_class: model.school_class,
        }
    }
}

#[derive(Clone)]
pub struct ParentService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl ParentService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub async fn paged(&self, params: &PageParameters) -> ServiceResult<Page<ParentSummaryDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<parent::Entity>::new(
            params,
            vec![
                parent::Column::FirstName,
                parent::Column::LastName,
                parent::Column::Email,
            ],
        )
        .with_default_order(parent::Column::LastName, Order::Asc);
        let page = repository::paged(&self.db, &spec, params).await?;
        Ok(page.map(ParentSummaryDto::from))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<ParentDto> {
        let model = repository::get::<parent::Entity, _>(&self.db, id, LABEL).await?;
        Ok(load_aggregate(&self.db, model).await?)
    }

    /// Whether a parent with this email is registered. Case-insensitive.
    pub async fn exists_by_email(&self, email: &str) -> ServiceResult<bool> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ServiceError::validation("Email is required"));
        }
        let found = parent::Entity::find()
            .filter(
                sea_orm::sea_query::Expr::expr(sea_orm::sea_query::Func::lower(
                    sea_orm::sea_query::Expr::col(parent::Column::Email),
                ))
                .eq(email.to_lowercase()),
            )
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    /// Learners linked to the parent, one entry per learner.
    pub async fn children(&self, id: &str) -> ServiceResult<Vec<ChildDto>> {
        if !repository::exists::<parent::Entity, _>(&self.db, id).await? {
            return Err(ServiceError::not_found(LABEL, id));
        }
        let links = learner_parent::Entity::find()
            .filter(learner_parent::Column::ParentId.eq(id))
            .find_also_related(learner::Entity)
            .all(&self.db)
            .await?;
        let mut seen = HashSet::new();
        Ok(links
            .into_iter()
            .filter_map(|(_, learner)| learner)
            .filter(|learner| seen.insert(learner.id.clone()))
            .map(ChildDto::from)
            .collect())
    }

    pub async fn create(&self, request: ParentRequest) -> ServiceResult<ParentDto> {
        let mut checks = Checks::default();
        let first_name = checks
            .required("First name", request.first_name.as_deref())
            .to_string();
        let last_name = checks
            .required("Last name", request.last_name.as_deref())
            .to_string();
        checks.finish()?;

        let id = id_or_new(request.id)?;
        let stamp = now();
        let txn = self.db.begin().await?;
        let model = parent::ActiveModel {
            id: Set(id.clone()),
            first_name: Set(first_name),
            last_name: Set(last_name),
            id_number: Set(request.id_number),
            email: Set(request.email),
            receive_notifications: Set(request.receive_notifications.unwrap_or(true)),
            receive_emails: Set(request.receive_emails.unwrap_or(true)),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(&txn)
        .await?;

        sync_addresses(&txn, &id, request.addresses.unwrap_or_default()).await?;
        sync_emergency_contacts(&txn, &id, request.emergency_contacts.unwrap_or_default()).await?;
        contact::sync_contact_numbers(&txn, Owner::Parent(&id), request.contact_numbers.unwrap_or_default())
            .await?;
        contact::sync_email_addresses(&txn, Owner::Parent(&id), request.email_addresses.unwrap_or_default())
            .await?;
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;

        crate::metrics::entity_created("parents");
        tracing::info!(parent_id = %id, "parent created");
        Ok(dto)
    }

    /// Writes only the fields present in the request. Child collections that
    /// are sent are diffed by id; omitted collections are left alone.
    pub async fn update(&self, request: ParentRequest) -> ServiceResult<ParentDto> {
        let id = request
            .id
            .clone()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<parent::Entity, _>(&self.db, &id, LABEL).await?;

        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(first_name) = request.first_name.as_deref() {
            active.first_name = Set(checks.required("First name", Some(first_name)).to_string());
        }
        if let Some(last_name) = request.last_name.as_deref() {
            active.last_name = Set(checks.required("Last name", Some(last_name)).to_string());
        }
        checks.finish()?;
        if let Some(id_number) = request.id_number {
            active.id_number = Set(Some(id_number));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(flag) = request.receive_notifications {
            active.receive_notifications = Set(flag);
        }
        if let Some(flag) = request.receive_emails {
            active.receive_emails = Set(flag);
        }
        active.updated_at = Set(now());

        let txn = self.db.begin().await?;
        let model = active.update(&txn).await?;
        if let Some(addresses) = request.addresses {
            sync_addresses(&txn, &id, addresses).await?;
        }
        if let Some(contacts) = request.emergency_contacts {
            sync_emergency_contacts(&txn, &id, contacts).await?;
        }
        if let Some(numbers) = request.contact_numbers {
            contact::sync_contact_numbers(&txn, Owner::Parent(&id), numbers).await?;
        }
        if let Some(emails) = request.email_addresses {
            contact::sync_email_addresses(&txn, Owner::Parent(&id), emails).await?;
        }
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;
        Ok(dto)
    }

    /// Child rows, learner links and consents go with the parent through the
    /// schema's cascades. Learners naming the parent for medical aid keep
    /// existing with that reference cleared.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        if repository::delete_by_id::<parent::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(LABEL, id));
        }
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("parents");
        tracing::info!(parent_id = %id, "parent deleted");
        Ok(())
    }
}

async fn load_aggregate<C: ConnectionTrait>(conn: &C, model: parent::Model) -> Result<ParentDto, DbErr> {
    let addresses = parent_address::Entity::find()
        .filter(parent_address::Column::ParentId.eq(model.id.as_str()))
        .order_by_asc(parent_address::Column::Line1)
        .all(conn)
        .await?;
    let emergency_contacts = emergency_contact::Entity::find()
        .filter(emergency_contact::Column::ParentId.eq(model.id.as_str()))
        .order_by_asc(emergency_contact::Column::Name)
        .all(conn)
        .await?;
    let links = learner_parent::Entity::find()
        .filter(learner_parent::Column::ParentId.eq(model.id.as_str()))
        .all(conn)
        .await?;
    let mut learner_ids: Vec<String> = Vec::new();
    for link in links {
        if !learner_ids.contains(&link.learner_id) {
            learner_ids.push(link.learner_id);
        }
    }

    Ok(ParentDto {
        contact_numbers: contact::contact_numbers(conn, Owner::Parent(&model.id)).await?,
        email_addresses: contact::email_addresses(conn, Owner::Parent(&model.id)).await?,
        addresses: addresses.into_iter().map(ParentAddressDto::from).collect(),
        emergency_contacts: emergency_contacts
            .into_iter()
            .map(EmergencyContactDto::from)
            .collect(),
        learner_ids,
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        id_number: model.id_number,
        email: model.email,
        receive_notifications: model.receive_notifications,
        receive_emails: model.receive_emails,
    })
}

async fn sync_addresses<C: ConnectionTrait>(
    conn: &C,
    parent_id: &str,
    incoming: Vec<ParentAddressDto>,
) -> Result<(), DbErr> {
    let owned = Condition::all().add(parent_address::Column::ParentId.eq(parent_id));
    let existing = parent_address::Entity::find().filter(owned).all(conn).await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|dto| dto.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        parent_address::Entity::delete_many()
            .filter(parent_address::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let mut inserts = Vec::new();
    for dto in incoming {
        let mut row = parent_address::ActiveModel {
            parent_id: Set(parent_id.to_string()),
            line1: Set(dto.line1),
            line2: Set(dto.line2),
            city: Set(dto.city),
            postal_code: Set(dto.postal_code),
            ..Default::default()
        };
        match dto.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                row.id = Set(id);
                row.update(conn).await?;
            }
            None => {
                row.id = Set(new_id());
                inserts.push(row);
            }
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}

async fn sync_emergency_contacts<C: ConnectionTrait>(
    conn: &C,
    parent_id: &str,
    incoming: Vec<EmergencyContactDto>,
) -> Result<(), DbErr> {
    let owned = Condition::all().add(emergency_contact::Column::ParentId.eq(parent_id));
    let existing = emergency_contact::Entity::find().filter(owned).all(conn).await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|dto| dto.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        emergency_contact::Entity::delete_many()
            .filter(emergency_contact::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let mut inserts = Vec::new();
    for dto in incoming {
        let mut row = emergency_contact::ActiveModel {
            parent_id: Set(parent_id.to_string()),
            name: Set(dto.name),
            relationship: Set(dto.relationship),
            contact_number: Set(dto.contact_number),
            ..Default::default()
        };
        match dto.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                row.id = Set(id);
                row.update(conn).await?;
            }
            None => {
                row.id = Set(new_id());
                inserts.push(row);
            }
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}
