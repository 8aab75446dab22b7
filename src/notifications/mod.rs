//! Notification enqueueing. Delivery is handled elsewhere; a notification is
//! enqueued once its row exists in the `notifications` table.

pub mod templates;

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{notification, parent};
use crate::error::ServiceResult;

pub use templates::{IncidentNotice, NotificationTemplates, RenderedNotice};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NotificationRecipient {
    pub parent_id: String,
    pub email: Option<String>,
    pub receive_notifications: bool,
    pub receive_emails: bool,
}

impl From<&parent::Model> for NotificationRecipient {
    fn from(parent: &parent::Model) -> Self {
        Self {
            parent_id: parent.id.clone(),
            email: parent.email.clone(),
            receive_notifications: parent.receive_notifications,
            receive_emails: parent.receive_emails,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NewNotification {
    pub entity_id: String,
    pub title: String,
    pub message: String,
    pub recipients: Vec<NotificationRecipient>,
}

#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn enqueue(&self, notification: NewNotification) -> ServiceResult<notification::Model>;
}

/// Enqueues by inserting into the `notifications` table.
#[derive(Clone)]
pub struct DbNotificationSender {
    db: DatabaseConnection,
}

impl DbNotificationSender {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationSender for DbNotificationSender {
    async fn enqueue(&self, new: NewNotification) -> ServiceResult<notification::Model> {
        let recipients = serde_json::to_value(&new.recipients)
            .map_err(|e| sea_orm::DbErr::Json(e.to_string()))?;
        let model = notification::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            entity_id: Set(new.entity_id),
            title: Set(new.title),
            message: Set(new.message),
            recipients: Set(recipients),
            created_at: Set(chrono::Utc::now().naive_utc()),
        }
        .insert(&self.db)
        .await?;

        tracing::info!(
            notification_id = %model.id,
            entity_id = %model.entity_id,
            recipients = new.recipients.len(),
            "notification enqueued"
        );
        Ok(model)
    }
}

/// One recipient per distinct parent, in first-seen order.
pub fn collect_recipients<'a>(
    parents: impl IntoIterator<Item = &'a parent::Model>,
) -> Vec<NotificationRecipient> {
    let mut seen: HashSet<String> = HashSet::new();
    parents
        .into_iter()
        .filter(|parent| seen.insert(parent.id.clone()))
        .map(NotificationRecipient::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent(id: &str, email: Option<&str>) -> parent::Model {
        let now = chrono::Utc::now().naive_utc();
        parent::Model {
            id: id.into(),
            first_name: "First".into(),
            last_name: "Last".into(),
            id_number: None,
            email: email.map(Into::into),
            receive_notifications: true,
            receive_emails: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn duplicate_parents_collapse_to_first_occurrence() {
        let first = parent("p1", Some("first@example.com"));
        let second = parent("p2", None);
        let mut duplicate = parent("p1", Some("later@example.com"));
        duplicate.receive_emails = true;

        let recipients = collect_recipients([&first, &second, &duplicate]);
        let ids: Vec<_> = recipients.iter().map(|r| r.parent_id.as_str()).collect();
        assert_eq!(ids, ["p1", "p2"]);
        assert_eq!(recipients[0].email.as_deref(), Some("first@example.com"));
        assert!(!recipients[0].receive_emails);
    }

    #[test]
    fn no_parents_means_no_recipients() {
        assert!(collect_recipients(std::iter::empty()).is_empty());
    }

    #[test]
    fn recipients_serialize_with_flags() {
        let json = serde_json::to_value(collect_recipients([&parent("p9", None)])).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "ParentId": "p9",
                "Email": null,
                "ReceiveNotifications": true,
                "ReceiveEmails": false
            }])
        );
    }
}
