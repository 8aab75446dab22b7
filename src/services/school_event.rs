use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    JoinType, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{
    activity_group, learner, learner_parent, parent, parent_permission,
    participating_activity_group, school_event,
};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::activity::ActivityGroupDto;
use crate::services::communication::purge_entity_references;
use crate::services::{id_or_new, new_id, now, Checks};
use crate::specification::{FilterSpec, PagedSpec};

const LABEL: &str = "School event";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchoolEventDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub start_date: chrono::NaiveDateTime,
    pub end_date: chrono::NaiveDateTime,
    pub requires_consent: bool,
}

impl From<school_event::Model> for SchoolEventDto {
    fn from(model: school_event::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            start_date: model.start_date,
            end_date: model.end_date,
            requires_consent: model.requires_consent,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SchoolEventRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<chrono::NaiveDateTime>,
    pub end_date: Option<chrono::NaiveDateTime>,
    pub requires_consent: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParticipationRequest {
    pub activity_group_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParentPermissionDto {
    pub id: String,
    pub event_id: String,
    pub learner_id: String,
    pub parent_id: String,
    pub granted: bool,
    pub responded_at: chrono::NaiveDateTime,
}

impl From<parent_permission::Model> for ParentPermissionDto {
    fn from(model: parent_permission::Model) -> Self {
        Self {
            id: model.id,
            event_id: model.event_id,
            learner_id: model.learner_id,
            parent_id: model.parent_id,
            granted: model.granted,
            responded_at: model.responded_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConsentRequest {
    pub learner_id: Option<String>,
    pub parent_id: Option<String>,
    pub granted: Option<bool>,
}

#[derive(Clone)]
pub struct SchoolEventService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl SchoolEventService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub async fn all(&self) -> ServiceResult<Vec<SchoolEventDto>> {
        let spec = FilterSpec::<school_event::Entity>::all()
            .order_by(school_event::Column::StartDate, Order::Desc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(SchoolEventDto::from).collect())
    }

    pub async fn paged(&self, params: &PageParameters) -> ServiceResult<Page<SchoolEventDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<school_event::Entity>::new(
            params,
            vec![school_event::Column::Name, school_event::Column::Description],
        )
        .with_default_order(school_event::Column::StartDate, Order::Desc);
        Ok(repository::paged(&self.db, &spec, params).await?.map(SchoolEventDto::from))
    }

    pub async fn get(&self, id: &str) -> ServiceResult<SchoolEventDto> {
        Ok(repository::get::<school_event::Entity, _>(&self.db, id, LABEL).await?.into())
    }

    pub async fn create(&self, request: SchoolEventRequest) -> ServiceResult<SchoolEventDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        checks.check(request.start_date.is_some(), "Start date is required");
        let start_date = request.start_date.unwrap_or_else(now);
        let end_date = request.end_date.unwrap_or(start_date);
        checks.check(start_date <= end_date, "End date may not be before start date");
        checks.finish()?;

        let model = school_event::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            description: Set(request.description),
            start_date: Set(start_date),
            end_date: Set(end_date),
            requires_consent: Set(request.requires_consent.unwrap_or(false)),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("school_events");
        tracing::info!(event_id = %model.id, "school event created");
        Ok(model.into())
    }

    pub async fn update(&self, request: SchoolEventRequest) -> ServiceResult<SchoolEventDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<school_event::Entity, _>(&self.db, id, LABEL).await?;
        let mut checks = Checks::default();
        let start_date = request.start_date.unwrap_or(existing.start_date);
        let end_date = request.end_date.unwrap_or(existing.end_date);
        checks.check(start_date <= end_date, "End date may not be before start date");

        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if request.start_date.is_some() {
            active.start_date = Set(start_date);
        }
        if request.end_date.is_some() {
            active.end_date = Set(end_date);
        }
        if let Some(requires_consent) = request.requires_consent {
            active.requires_consent = Set(requires_consent);
        }
        Ok(active.update(&self.db).await?.into())
    }

    /// Participation rows are removed here; consents go through the schema's
    /// cascade.
    pub async fn delete(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        participating_activity_group::Entity::delete_many()
            .filter(participating_activity_group::Column::EventId.eq(id))
            .exec(&txn)
            .await?;
        if repository::delete_by_id::<school_event::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(LABEL, id));
        }
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("school_events");
        tracing::info!(event_id = %id, "school event deleted");
        Ok(())
    }

    pub async fn activity_groups(&self, event_id: &str) -> ServiceResult<Vec<ActivityGroupDto>> {
        repository::get::<school_event::Entity, _>(&self.db, event_id, LABEL).await?;
        let groups = activity_group::Entity::find()
            .join(
                JoinType::InnerJoin,
                activity_group::Relation::Participations.def(),
            )
            .filter(participating_activity_group::Column::EventId.eq(event_id))
            .order_by_asc(activity_group::Column::Name)
            .all(&self.db)
            .await?;
        Ok(groups.into_iter().map(ActivityGroupDto::from).collect())
    }

    pub async fn add_activity_group(
        &self,
        event_id: &str,
        request: ParticipationRequest,
    ) -> ServiceResult<ActivityGroupDto> {
        let mut checks = Checks::default();
        let group_id = checks
            .required("Activity group", request.activity_group_id.as_deref())
            .to_string();
        checks.finish()?;

        let event = repository::get::<school_event::Entity, _>(&self.db, event_id, LABEL).await?;
        let group =
            repository::get::<activity_group::Entity, _>(&self.db, &group_id, "Activity group").await?;
        let already = participating_activity_group::Entity::find()
            .filter(participating_activity_group::Column::EventId.eq(event_id))
            .filter(participating_activity_group::Column::ActivityGroupId.eq(group_id.as_str()))
            .count(&self.db)
            .await?;
        if already > 0 {
            return Err(ServiceError::validation(format!(
                "{} already takes part in {}",
                group.name, event.name
            )));
        }

        participating_activity_group::ActiveModel {
            id: Set(new_id()),
            event_id: Set(event_id.to_string()),
            activity_group_id: Set(group_id),
        }
        .insert(&self.db)
        .await?;
        Ok(group.into())
    }

    pub async fn remove_activity_group(&self, event_id: &str, group_id: &str) -> ServiceResult<()> {
        let removed = participating_activity_group::Entity::delete_many()
            .filter(participating_activity_group::Column::EventId.eq(event_id))
            .filter(participating_activity_group::Column::ActivityGroupId.eq(group_id))
            .exec(&self.db)
            .await?
            .rows_affected;
        if removed == 0 {
            return Err(ServiceError::NotFound(format!(
                "Activity group with id {group_id} does not take part in event {event_id}"
            )));
        }
        Ok(())
    }

    pub async fn permissions(&self, event_id: &str) -> ServiceResult<Vec<ParentPermissionDto>> {
        repository::get::<school_event::Entity, _>(&self.db, event_id, LABEL).await?;
        let rows = parent_permission::Entity::find()
            .filter(parent_permission::Column::EventId.eq(event_id))
            .order_by_asc(parent_permission::Column::RespondedAt)
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(ParentPermissionDto::from).collect())
    }

    /// Records a parent's answer for one learner. A second answer for the same
    /// learner and parent replaces the first.
    pub async fn record_permission(
        &self,
        event_id: &str,
        request: ConsentRequest,
    ) -> ServiceResult<ParentPermissionDto> {
        let mut checks = Checks::default();
        let learner_id = checks.required("Learner", request.learner_id.as_deref()).to_string();
        let parent_id = checks.required("Parent", request.parent_id.as_deref()).to_string();
        checks.check(request.granted.is_some(), "Granted is required");
        checks.finish()?;
        let granted = request.granted.unwrap_or(false);

        let event = repository::get::<school_event::Entity, _>(&self.db, event_id, LABEL).await?;
        if !event.requires_consent {
            return Err(ServiceError::validation(format!(
                "{} does not require parental consent",
                event.name
            )));
        }
        repository::get::<learner::Entity, _>(&self.db, &learner_id, "Learner").await?;
        repository::get::<parent::Entity, _>(&self.db, &parent_id, "Parent").await?;
        let linked = learner_parent::Entity::find()
            .filter(
                Condition::all()
                    .add(learner_parent::Column::LearnerId.eq(learner_id.as_str()))
                    .add(learner_parent::Column::ParentId.eq(parent_id.as_str())),
            )
            .count(&self.db)
            .await?;
        if linked == 0 {
            return Err(ServiceError::validation(
                "Only a linked parent can answer for a learner",
            ));
        }

        let existing = parent_permission::Entity::find()
            .filter(parent_permission::Column::EventId.eq(event_id))
            .filter(parent_permission::Column::LearnerId.eq(learner_id.as_str()))
            .filter(parent_permission::Column::ParentId.eq(parent_id.as_str()))
            .one(&self.db)
            .await?;
        let model = match existing {
            Some(row) => {
                let mut active = row.into_active_model();
                active.granted = Set(granted);
                active.responded_at = Set(now());
                active.update(&self.db).await?
            }
            None => {
                parent_permission::ActiveModel {
                    id: Set(new_id()),
                    event_id: Set(event_id.to_string()),
                    learner_id: Set(learner_id),
                    parent_id: Set(parent_id),
                    granted: Set(granted),
                    responded_at: Set(now()),
                }
                .insert(&self.db)
                .await?
            }
        };
        tracing::info!(
            event_id = %event_id,
            learner_id = %model.learner_id,
            granted,
            "parental consent recorded"
        );
        Ok(model.into())
    }
}
