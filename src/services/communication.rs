use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, Order, QueryFilter, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::{message, notification};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::{id_or_new, now, Checks};
use crate::specification::{FilterSpec, PagedSpec};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationDto {
    pub id: String,
    pub entity_id: String,
    pub title: String,
    pub message: String,
    pub recipients: serde_json::Value,
    pub created_at: chrono::NaiveDateTime,
}

impl From<notification::Model> for NotificationDto {
    fn from(model: notification::Model) -> Self {
        Self {
            id: model.id,
            entity_id: model.entity_id,
            title: model.title,
            message: model.message,
            recipients: model.recipients,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageDto {
    pub id: String,
    pub entity_id: String,
    pub sender_id: Option<String>,
    pub subject: String,
    pub body: String,
    pub created_at: chrono::NaiveDateTime,
}

impl From<message::Model> for MessageDto {
    fn from(model: message::Model) -> Self {
        Self {
            id: model.id,
            entity_id: model.entity_id,
            sender_id: model.sender_id,
            subject: model.subject,
            body: model.body,
            created_at: model.created_at,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub entity_id: Option<String>,
    pub subject: Option<String>,
    pub body: Option<String>,
}

/// Rows removed from the communication side tables for one entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PurgedReferences {
    pub notifications: u64,
    pub messages: u64,
}

/// Deletes every notification and message whose `entity_id` is one of `ids`.
/// Runs on whatever connection it is given, so callers pass their open
/// transaction.
pub async fn purge_entity_references<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> Result<PurgedReferences, DbErr> {
    if ids.is_empty() {
        return Ok(PurgedReferences::default());
    }
    let notifications = notification::Entity::delete_many()
        .filter(notification::Column::EntityId.is_in(ids.iter().cloned()))
        .exec(conn)
        .await?
        .rows_affected;
    let messages = message::Entity::delete_many()
        .filter(message::Column::EntityId.is_in(ids.iter().cloned()))
        .exec(conn)
        .await?
        .rows_affected;
    Ok(PurgedReferences {
        notifications,
        messages,
    })
}

#[derive(Clone)]
pub struct CommunicationService {
    db: DatabaseConnection,
    max_page_size: u64,
}

impl CommunicationService {
    pub fn new(db: DatabaseConnection, max_page_size: u64) -> Self {
        Self { db, max_page_size }
    }

    pub async fn notifications_for(
        &self,
        entity_id: &str,
        params: &PageParameters,
    ) -> ServiceResult<Page<NotificationDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<notification::Entity>::new(
            params,
            vec![notification::Column::Title, notification::Column::Message],
        )
        .with_filter(Condition::all().add(notification::Column::EntityId.eq(entity_id)))
        .with_default_order(notification::Column::CreatedAt, Order::Desc);
        let page = repository::paged(&self.db, &spec, params).await?;
        Ok(page.map(NotificationDto::from))
    }

    pub async fn delete_notification(&self, id: &str) -> ServiceResult<()> {
        if repository::delete_by_id::<notification::Entity, _>(&self.db, id).await? == 0 {
            return Err(ServiceError::not_found("Notification", id));
        }
        crate::metrics::entity_deleted("notifications");
        Ok(())
    }

    pub async fn create_message(
        &self,
        request: MessageRequest,
        sender_id: Option<String>,
    ) -> ServiceResult<MessageDto> {
        let mut checks = Checks::default();
        let entity_id = checks.required("Entity id", request.entity_id.as_deref()).to_string();
        let subject = checks.required("Subject", request.subject.as_deref()).to_string();
        let body = checks.required("Body", request.body.as_deref()).to_string();
        checks.finish()?;

        let model = message::ActiveModel {
            id: Set(id_or_new(request.id)?),
            entity_id: Set(entity_id),
            sender_id: Set(sender_id),
            subject: Set(subject),
            body: Set(body),
            created_at: Set(now()),
        }
        .insert(&self.db)
        .await?;

        crate::metrics::entity_created("messages");
        tracing::info!(message_id = %model.id, entity_id = %model.entity_id, "message created");
        Ok(model.into())
    }

    pub async fn messages_for(&self, entity_id: &str) -> ServiceResult<Vec<MessageDto>> {
        let spec = FilterSpec::<message::Entity>::new(
            Condition::all().add(message::Column::EntityId.eq(entity_id)),
        )
        .order_by(message::Column::CreatedAt, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(MessageDto::from).collect())
    }
}
