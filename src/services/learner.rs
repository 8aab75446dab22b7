use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Order, PaginatorTrait, QueryFilter, QuerySelect, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{disciplinary_incident, learner, learner_parent, parent, school_grade};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::contact::{self, ContactNumberDto, EmailAddressDto, Owner};
use crate::services::{id_or_new, new_id, now, Checks};
use crate::specification::PagedSpec;

const LABEL: &str = "Learner";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearnerSummaryDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub school_grade_id: Option<String>,
    pub school_class: Option<String>,
}

impl From<learner::Model> for LearnerSummaryDto {
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

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearnerParentDto {
    pub link_id: String,
    pub parent_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearnerDto {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub id_number: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub school_grade_id: Option<String>,
    pub school_class: Option<String>,
    pub medical_aid_parent_id: Option<String>,
    /// One entry per distinct parent.
    pub parents: Vec<LearnerParentDto>,
    pub contact_numbers: Vec<ContactNumberDto>,
    pub email_addresses: Vec<EmailAddressDto>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LearnerRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub id_number: Option<String>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub school_grade_id: Option<String>,
    pub school_class: Option<String>,
    pub medical_aid_parent_id: Option<String>,
    pub parent_ids: Option<Vec<String>>,
    pub contact_numbers: Option<Vec<ContactNumberDto>>,
    pub email_addresses: Option<Vec<EmailAddressDto>>,
}

/// Parent links to add and remove so that a learner ends up linked to exactly
/// the requested parents. Links to parents that stay are not touched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ParentLinkChanges {
    pub remove_link_ids: Vec<String>,
    pub add_parent_ids: Vec<String>,
}

pub fn plan_parent_links(
    existing: &[learner_parent::Model],
    requested: &[String],
) -> ParentLinkChanges {
    let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
    let mut changes = ParentLinkChanges::default();
    let mut linked = HashSet::new();
    for link in existing {
        match link.parent_id.as_deref() {
            Some(parent_id) if wanted.contains(parent_id) => {
                linked.insert(parent_id);
            }
            Some(_) => changes.remove_link_ids.push(link.id.clone()),
            None => {}
        }
    }
    for parent_id in requested {
        if linked.insert(parent_id.as_str()) {
            changes.add_parent_ids.push(parent_id.clone());
        }
    }
    changes
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnerFilter {
    #[serde(default, alias = "GradeId")]
    pub grade_id: Option<String>,
}

#[derive(Clone)]
pub struct LearnerService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl LearnerService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub async fn paged(
        &self,
        params: &PageParameters,
        filter: &LearnerFilter,
    ) -> ServiceResult<Page<LearnerSummaryDto>> {
        params.validate(self.max_page_size)?;
        let mut spec = PagedSpec::<learner::Entity>::new(
            params,
            vec![
                learner::Column::FirstName,
                learner::Column::LastName,
                learner::Column::IdNumber,
            ],
        )
        .with_default_order(learner::Column::LastName, Order::Asc);
        if let Some(grade_id) = filter.grade_id.as_deref().filter(|g| !g.is_empty()) {
            spec = spec.with_filter(Condition::all().add(learner::Column::SchoolGradeId.eq(grade_id)));
        }
        let page = repository::paged(&self.db, &spec, params).await?;
        Ok(page.map(LearnerSummaryDto::from))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<LearnerDto> {
        let model = repository::get::<learner::Entity, _>(&self.db, id, LABEL).await?;
        Ok(load_aggregate(&self.db, model).await?)
    }

    /// Whether a learner with this identity number is on record.
    pub async fn exists_by_id_number(&self, id_number: &str) -> ServiceResult<bool> {
        let id_number = id_number.trim();
        if id_number.is_empty() {
            return Err(ServiceError::validation("Id number is required"));
        }
        let count = learner::Entity::find()
            .filter(learner::Column::IdNumber.eq(id_number))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, request: LearnerRequest) -> ServiceResult<LearnerDto> {
        let mut checks = Checks::default();
        let first_name = checks
            .required("First name", request.first_name.as_deref())
            .to_string();
        let last_name = checks
            .required("Last name", request.last_name.as_deref())
            .to_string();
        checks.finish()?;

        let parent_ids = request.parent_ids.unwrap_or_default();
        self.check_references(
            request.school_grade_id.as_deref(),
            request.medical_aid_parent_id.as_deref(),
            &parent_ids,
        )
        .await?;

        let id = id_or_new(request.id)?;
        let stamp = now();
        let txn = self.db.begin().await?;
        let model = learner::ActiveModel {
            id: Set(id.clone()),
            first_name: Set(first_name),
            last_name: Set(last_name),
            id_number: Set(request.id_number),
            date_of_birth: Set(request.date_of_birth),
            school_grade_id: Set(request.school_grade_id),
            school_class: Set(request.school_class),
            medical_aid_parent_id: Set(request.medical_aid_parent_id),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(&txn)
        .await?;

        let changes = plan_parent_links(&[], &parent_ids);
        link_parents(&txn, &id, changes.add_parent_ids).await?;
        contact::sync_contact_numbers(&txn, Owner::Learner(&id), request.contact_numbers.unwrap_or_default())
            .await?;
        contact::sync_email_addresses(&txn, Owner::Learner(&id), request.email_addresses.unwrap_or_default())
            .await?;
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;

        crate::metrics::entity_created("learners");
        tracing::info!(learner_id = %id, parents = dto.parents.len(), "learner created");
        Ok(dto)
    }

    pub async fn update(&self, request: LearnerRequest) -> ServiceResult<LearnerDto> {
        let id = request
            .id
            .clone()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<learner::Entity, _>(&self.db, &id, LABEL).await?;
        self.check_references(
            request.school_grade_id.as_deref(),
            request.medical_aid_parent_id.as_deref(),
            request.parent_ids.as_deref().unwrap_or_default(),
        )
        .await?;

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
        if let Some(date_of_birth) = request.date_of_birth {
            active.date_of_birth = Set(Some(date_of_birth));
        }
        if let Some(grade_id) = request.school_grade_id {
            active.school_grade_id = Set(Some(grade_id));
        }
        if let Some(school_class) = request.school_class {
            active.school_class = Set(Some(school_class));
        }
        if let Some(parent_id) = request.medical_aid_parent_id {
            active.medical_aid_parent_id = Set(Some(parent_id));
        }
        active.updated_at = Set(now());

        let txn = self.db.begin().await?;
        let model = active.update(&txn).await?;
        if let Some(parent_ids) = request.parent_ids {
            let links = learner_parent::Entity::find()
                .filter(learner_parent::Column::LearnerId.eq(id.as_str()))
                .all(&txn)
                .await?;
            let changes = plan_parent_links(&links, &parent_ids);
            if !changes.remove_link_ids.is_empty() {
                learner_parent::Entity::delete_many()
                    .filter(learner_parent::Column::Id.is_in(changes.remove_link_ids))
                    .exec(&txn)
                    .await?;
            }
            link_parents(&txn, &id, changes.add_parent_ids).await?;
        }
        if let Some(numbers) = request.contact_numbers {
            contact::sync_contact_numbers(&txn, Owner::Learner(&id), numbers).await?;
        }
        if let Some(emails) = request.email_addresses {
            contact::sync_email_addresses(&txn, Owner::Learner(&id), emails).await?;
        }
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;
        Ok(dto)
    }

    /// Links, contact rows, consents and incidents go through the schema's
    /// cascades; notifications and messages about the learner or any of
    /// their incidents are removed here.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let mut referenced: Vec<String> = disciplinary_incident::Entity::find()
            .select_only()
            .column(disciplinary_incident::Column::Id)
            .filter(disciplinary_incident::Column::LearnerId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;
        if repository::delete_by_id::<learner::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(LABEL, id));
        }
        referenced.push(id.to_string());
        purge_entity_references(&txn, &referenced).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("learners");
        tracing::info!(learner_id = %id, "learner deleted");
        Ok(())
    }

    async fn check_references(
        &self,
        grade_id: Option<&str>,
        medical_aid_parent_id: Option<&str>,
        parent_ids: &[String],
    ) -> ServiceResult<()> {
        let mut missing = Vec::new();
        if let Some(grade_id) = grade_id {
            if !repository::exists::<school_grade::Entity, _>(&self.db, grade_id).await? {
                missing.push(ServiceError::not_found("School grade", grade_id).to_string());
            }
        }
        let mut wanted: Vec<&str> = parent_ids.iter().map(String::as_str).collect();
        wanted.extend(medical_aid_parent_id);
        if !wanted.is_empty() {
            let found: HashSet<String> = parent::Entity::find()
                .select_only()
                .column(parent::Column::Id)
                .filter(parent::Column::Id.is_in(wanted.iter().copied()))
                .into_tuple::<String>()
                .all(&self.db)
                .await?
                .into_iter()
                .collect();
            let mut reported = HashSet::new();
            for parent_id in wanted {
                if !found.contains(parent_id) && reported.insert(parent_id) {
                    missing.push(ServiceError::not_found("Parent", parent_id).to_string());
                }
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::Validation(missing))
        }
    }
}

async fn link_parents<C: ConnectionTrait>(
    conn: &C,
    learner_id: &str,
    parent_ids: Vec<String>,
) -> Result<u64, DbErr> {
    let rows = parent_ids
        .into_iter()
        .map(|parent_id| learner_parent::ActiveModel {
            id: Set(new_id()),
            learner_id: Set(learner_id.to_string()),
            parent_id: Set(Some(parent_id)),
        })
        .collect();
    repository::insert_all(conn, rows).await
}

async fn load_aggregate<C: ConnectionTrait>(conn: &C, model: learner::Model) -> Result<LearnerDto, DbErr> {
    let links = learner_parent::Entity::find()
        .filter(learner_parent::Column::LearnerId.eq(model.id.as_str()))
        .all(conn)
        .await?;
    let mut seen = HashSet::new();
    let parents = links
        .into_iter()
        .filter_map(|link| {
            let parent_id = link.parent_id?;
            seen.insert(parent_id.clone()).then_some(LearnerParentDto {
                link_id: link.id,
                parent_id,
            })
        })
        .collect();

    Ok(LearnerDto {
        contact_numbers: contact::contact_numbers(conn, Owner::Learner(&model.id)).await?,
        email_addresses: contact::email_addresses(conn, Owner::Learner(&model.id)).await?,
        parents,
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        id_number: model.id_number,
        date_of_birth: model.date_of_birth,
        school_grade_id: model.school_grade_id,
        school_class: model.school_class,
        medical_aid_parent_id: model.medical_aid_parent_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, parent_id: Option<&str>) -> learner_parent::Model {
        learner_parent::Model {
            id: id.into(),
            learner_id: "l1".into(),
            parent_id: parent_id.map(Into::into),
        }
    }

    #[test]
    fn replacing_one_parent_keeps_the_shared_link() {
        let existing = [link("k1", Some("p1")), link("k2", Some("p2"))];
        let changes = plan_parent_links(&existing, &["p2".into(), "p3".into()]);
        assert_eq!(changes.remove_link_ids, vec!["k1".to_string()]);
        assert_eq!(changes.add_parent_ids, vec!["p3".to_string()]);
    }

    #[test]
    fn duplicate_requests_add_a_single_link() {
        let changes = plan_parent_links(&[], &["p1".into(), "p1".into()]);
        assert_eq!(changes.add_parent_ids, vec!["p1".to_string()]);
    }

    #[test]
    fn links_without_parent_are_left_alone() {
        let existing = [link("k1", None), link("k2", Some("p2"))];
        let changes = plan_parent_links(&existing, &["p2".into()]);
        assert_eq!(changes, ParentLinkChanges::default());
    }

    #[test]
    fn duplicate_stored_links_for_a_kept_parent_stay() {
        let existing = [link("k1", Some("p1")), link("k2", Some("p1"))];
        let changes = plan_parent_links(&existing, &["p1".into()]);
        assert_eq!(changes, ParentLinkChanges::default());
    }
}
