use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, IntoActiveModel,
    Order, PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{
    disciplinary_action, disciplinary_incident, learner, learner_parent, parent, severity_scale,
};
use crate::error::{ServiceError, ServiceResult};
use crate::notifications::{
    collect_recipients, IncidentNotice, NewNotification, NotificationSender,
    NotificationTemplates,
};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::{id_or_new, now, Checks};
use crate::specification::{FilterSpec, PagedSpec};

const SCALE: &str = "Severity scale";
const ACTION: &str = "Disciplinary action";
const INCIDENT: &str = "Disciplinary incident";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeverityScaleDto {
    pub id: String,
    pub name: String,
    pub score: i32,
    pub description: Option<String>,
}

impl From<severity_scale::Model> for SeverityScaleDto {
    fn from(model: severity_scale::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            score: model.score,
            description: model.description,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SeverityScaleRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub score: Option<i32>,
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisciplinaryActionDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub severity_scale_id: String,
}

impl From<disciplinary_action::Model> for DisciplinaryActionDto {
    fn from(model: disciplinary_action::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            severity_scale_id: model.severity_scale_id,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisciplinaryActionRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub severity_scale_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncidentDto {
    pub id: String,
    pub learner_id: String,
    pub disciplinary_action_id: String,
    pub occurred_at: chrono::NaiveDateTime,
    pub description: String,
    pub created_at: chrono::NaiveDateTime,
}

impl From<disciplinary_incident::Model> for IncidentDto {
    fn from(model: disciplinary_incident::Model) -> Self {
        Self {
            id: model.id,
            learner_id: model.learner_id,
            disciplinary_action_id: model.disciplinary_action_id,
            occurred_at: model.occurred_at,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncidentRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub learner_id: Option<String>,
    pub disciplinary_action_id: Option<String>,
    pub occurred_at: Option<chrono::NaiveDateTime>,
    pub description: Option<String>,
}

#[derive(Clone)]
pub struct DisciplineService {
    db: DatabaseConnection,
    max_page_size: u64,
    sender: Arc<dyn NotificationSender>,
    templates: Arc<NotificationTemplates>,
}

impl DisciplineService {
    pub fn new(
        db: DatabaseConnection,
        max_page_size: u64,
        sender: Arc<dyn NotificationSender>,
        templates: Arc<NotificationTemplates>,
    ) -> Self {
        Self {
            db,
            max_page_size,
            sender,
            templates,
        }
    }

    // Severity scales

    pub async fn all_scales(&self) -> ServiceResult<Vec<SeverityScaleDto>> {
        let spec = FilterSpec::<severity_scale::Entity>::all()
            .order_by(severity_scale::Column::Score, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(SeverityScaleDto::from).collect())
    }

    pub async fn paged_scales(&self, params: &PageParameters) -> ServiceResult<Page<SeverityScaleDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<severity_scale::Entity>::new(
            params,
            vec![severity_scale::Column::Name, severity_scale::Column::Description],
        )
        .with_default_order(severity_scale::Column::Score, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params).await?.map(SeverityScaleDto::from))
    }

    pub async fn get_scale(&self, id: &str) -> ServiceResult<SeverityScaleDto> {
        Ok(repository::get::<severity_scale::Entity, _>(&self.db, id, SCALE).await?.into())
    }

    pub async fn create_scale(&self, request: SeverityScaleRequest) -> ServiceResult<SeverityScaleDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        checks.check(request.score.is_some(), "Score is required");
        checks.finish()?;

        let model = severity_scale::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            score: Set(request.score.unwrap_or_default()),
            description: Set(request.description),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("severity_scales");
        Ok(model.into())
    }

    pub async fn update_scale(&self, request: SeverityScaleRequest) -> ServiceResult<SeverityScaleDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<severity_scale::Entity, _>(&self.db, id, SCALE).await?;
        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(score) = request.score {
            active.score = Set(score);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        Ok(active.update(&self.db).await?.into())
    }

    /// Refused while any disciplinary action still uses the scale.
    pub async fn delete_scale(&self, id: &str) -> ServiceResult<()> {
        let scale = repository::get::<severity_scale::Entity, _>(&self.db, id, SCALE).await?;
        let users = disciplinary_action::Entity::find()
            .filter(disciplinary_action::Column::SeverityScaleId.eq(id))
            .count(&self.db)
            .await?;
        if users > 0 {
            return Err(ServiceError::validation(format!(
                "Severity scale {} is used by {users} disciplinary action(s)",
                scale.name
            )));
        }

        let txn = self.db.begin().await?;
        repository::delete_by_id::<severity_scale::Entity, _>(&txn, id).await?;
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("severity_scales");
        Ok(())
    }

    // Disciplinary actions

    pub async fn all_actions(&self) -> ServiceResult<Vec<DisciplinaryActionDto>> {
        let spec = FilterSpec::<disciplinary_action::Entity>::all()
            .order_by(disciplinary_action::Column::Name, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(DisciplinaryActionDto::from).collect())
    }

    pub async fn paged_actions(
        &self,
        params: &PageParameters,
    ) -> ServiceResult<Page<DisciplinaryActionDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<disciplinary_action::Entity>::new(
            params,
            vec![
                disciplinary_action::Column::Name,
                disciplinary_action::Column::Description,
            ],
        )
        .with_default_order(disciplinary_action::Column::Name, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params)
            .await?
            .map(DisciplinaryActionDto::from))
    }

    pub async fn get_action(&self, id: &str) -> ServiceResult<DisciplinaryActionDto> {
        Ok(repository::get::<disciplinary_action::Entity, _>(&self.db, id, ACTION)
            .await?
            .into())
    }

    pub async fn create_action(
        &self,
        request: DisciplinaryActionRequest,
    ) -> ServiceResult<DisciplinaryActionDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        let scale_id = checks
            .required("Severity scale", request.severity_scale_id.as_deref())
            .to_string();
        checks.finish()?;
        repository::get::<severity_scale::Entity, _>(&self.db, &scale_id, SCALE).await?;

        let model = disciplinary_action::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            description: Set(request.description),
            severity_scale_id: Set(scale_id),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("disciplinary_actions");
        Ok(model.into())
    }

    pub async fn update_action(
        &self,
        request: DisciplinaryActionRequest,
    ) -> ServiceResult<DisciplinaryActionDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<disciplinary_action::Entity, _>(&self.db, id, ACTION).await?;
        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(scale_id) = request.severity_scale_id {
            repository::get::<severity_scale::Entity, _>(&self.db, &scale_id, SCALE).await?;
            active.severity_scale_id = Set(scale_id);
        }
        Ok(active.update(&self.db).await?.into())
    }

    /// Incidents recorded under the action are removed with it, together
    /// with anything in the communication tables about them.
    pub async fn delete_action(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        let mut referenced: Vec<String> = disciplinary_incident::Entity::find()
            .select_only()
            .column(disciplinary_incident::Column::Id)
            .filter(disciplinary_incident::Column::DisciplinaryActionId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;
        if repository::delete_by_id::<disciplinary_action::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(ACTION, id));
        }
        referenced.push(id.to_string());
        purge_entity_references(&txn, &referenced).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("disciplinary_actions");
        Ok(())
    }

    // Incidents

    pub async fn incidents_for_learner(&self, learner_id: &str) -> ServiceResult<Vec<IncidentDto>> {
        if !repository::exists::<learner::Entity, _>(&self.db, learner_id).await? {
            return Err(ServiceError::not_found("Learner", learner_id));
        }
        let spec = FilterSpec::<disciplinary_incident::Entity>::new(
            Condition::all().add(disciplinary_incident::Column::LearnerId.eq(learner_id)),
        )
        .order_by(disciplinary_incident::Column::OccurredAt, Order::Desc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(IncidentDto::from).collect())
    }

    /// Records the incident, then tells the learner's parents. The incident
    /// stands even when the notification cannot be enqueued.
    pub async fn record_incident(&self, request: IncidentRequest) -> ServiceResult<IncidentDto> {
        let mut checks = Checks::default();
        let learner_id = checks.required("Learner", request.learner_id.as_deref()).to_string();
        let action_id = checks
            .required("Disciplinary action", request.disciplinary_action_id.as_deref())
            .to_string();
        let description = checks
            .required("Description", request.description.as_deref())
            .to_string();
        checks.finish()?;

        let learner = repository::get::<learner::Entity, _>(&self.db, &learner_id, "Learner").await?;
        let action =
            repository::get::<disciplinary_action::Entity, _>(&self.db, &action_id, ACTION).await?;

        let stamp = now();
        let incident = disciplinary_incident::ActiveModel {
            id: Set(id_or_new(request.id)?),
            learner_id: Set(learner_id),
            disciplinary_action_id: Set(action_id),
            occurred_at: Set(request.occurred_at.unwrap_or(stamp)),
            description: Set(description),
            created_at: Set(stamp),
        }
        .insert(&self.db)
        .await?;

        crate::metrics::increment_incidents_recorded();
        tracing::info!(
            incident_id = %incident.id,
            learner_id = %incident.learner_id,
            "disciplinary incident recorded"
        );

        match self.notify_parents(&incident, &learner, &action).await {
            Ok(0) => {
                crate::metrics::increment_notifications_skipped();
                tracing::info!(incident_id = %incident.id, "learner has no linked parents, nothing enqueued");
            }
            Ok(recipients) => {
                crate::metrics::increment_notifications_enqueued();
                tracing::info!(incident_id = %incident.id, recipients, "incident notification enqueued");
            }
            Err(e) => {
                crate::metrics::increment_notifications_failed();
                tracing::error!(incident_id = %incident.id, error = %e, "failed to enqueue incident notification");
            }
        }

        Ok(incident.into())
    }

    pub async fn delete_incident(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        if repository::delete_by_id::<disciplinary_incident::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(INCIDENT, id));
        }
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("disciplinary_incidents");
        Ok(())
    }

    /// Returns the number of recipients; zero means nothing was enqueued.
    async fn notify_parents(
        &self,
        incident: &disciplinary_incident::Model,
        learner: &learner::Model,
        action: &disciplinary_action::Model,
    ) -> ServiceResult<usize> {
        let links = learner_parent::Entity::find()
            .filter(learner_parent::Column::LearnerId.eq(learner.id.as_str()))
            .find_also_related(parent::Entity)
            .all(&self.db)
            .await?;
        let parents: Vec<parent::Model> = links.into_iter().filter_map(|(_, p)| p).collect();
        let recipients = collect_recipients(&parents);
        if recipients.is_empty() {
            return Ok(0);
        }

        let learner_name = format!("{} {}", learner.first_name, learner.last_name);
        let rendered = self
            .templates
            .incident(&IncidentNotice {
                learner_name: &learner_name,
                action_name: &action.name,
                occurred_at: incident.occurred_at.format("%Y-%m-%d %H:%M").to_string(),
                description: &incident.description,
            })
            .map_err(|e| ServiceError::validation(format!("Notification template failed: {e}")))?;

        let count = recipients.len();
        self.sender
            .enqueue(NewNotification {
                entity_id: incident.id.clone(),
                title: rendered.title,
                message: rendered.message,
                recipients,
            })
            .await?;
        Ok(count)
    }
}
