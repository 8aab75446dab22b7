#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use schoolhub_server::config::AppConfig;
use schoolhub_server::entities::notification;
use schoolhub_server::error::{ServiceError, ServiceResult};
use schoolhub_server::migrator::Migrator;
use schoolhub_server::notifications::{NewNotification, NotificationSender};
use schoolhub_server::services::learner::LearnerRequest;
use schoolhub_server::services::media::LocalMediaStore;
use schoolhub_server::services::parent::ParentRequest;
use schoolhub_server::services::school_grade::SchoolGradeRequest;
use schoolhub_server::services::Services;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

/// Keeps every notification it is asked to enqueue.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<NewNotification>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<NewNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn enqueue(&self, new: NewNotification) -> ServiceResult<notification::Model> {
        let model = notification::Model {
            id: uuid::Uuid::new_v4().to_string(),
            entity_id: new.entity_id.clone(),
            title: new.title.clone(),
            message: new.message.clone(),
            recipients: serde_json::to_value(&new.recipients).unwrap(),
            created_at: chrono::Utc::now().naive_utc(),
        };
        self.sent.lock().unwrap().push(new);
        Ok(model)
    }
}

pub struct FailingSender;

#[async_trait]
impl NotificationSender for FailingSender {
    async fn enqueue(&self, _new: NewNotification) -> ServiceResult<notification::Model> {
        Err(ServiceError::Storage("notification queue unavailable".into()))
    }
}

pub struct TestApp {
    pub db: DatabaseConnection,
    pub config: AppConfig,
    pub services: Services,
    pub media_root: PathBuf,
}

/// One in-memory database per call. A single pooled connection keeps the
/// database alive for the whole test.
pub async fn connect() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

pub async fn setup() -> (TestApp, Arc<RecordingSender>) {
    let sender = Arc::new(RecordingSender::default());
    let app = setup_with_sender(sender.clone()).await;
    (app, sender)
}

pub async fn setup_with_sender(sender: Arc<dyn NotificationSender>) -> TestApp {
    let db = connect().await;
    let media_root = std::env::temp_dir().join(format!("schoolhub-test-{}", uuid::Uuid::new_v4()));
    let mut config = AppConfig::for_database("sqlite::memory:");
    config.media.root = media_root.clone();
    config.media.max_upload_bytes = 1024;
    config.media.upload_concurrency = 2;
    let media = Arc::new(LocalMediaStore::new(media_root.clone(), "/media"));
    let services = Services::new(db.clone(), &config, sender, media).unwrap();
    TestApp {
        db,
        config,
        services,
        media_root,
    }
}

pub async fn grade(services: &Services, name: &str) -> String {
    services
        .school_grades
        .create(SchoolGradeRequest {
            name: Some(name.into()),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

pub async fn parent(services: &Services, first_name: &str) -> String {
    services
        .parents
        .create(ParentRequest {
            first_name: Some(first_name.into()),
            last_name: Some("Parent".into()),
            email: Some(format!("{}@example.com", first_name.to_lowercase())),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

pub async fn learner(services: &Services, grade_id: Option<&str>, parent_ids: &[&str]) -> String {
    services
        .learners
        .create(LearnerRequest {
            first_name: Some("Thandi".into()),
            last_name: Some("Learner".into()),
            school_grade_id: grade_id.map(str::to_string),
            parent_ids: Some(parent_ids.iter().map(|p| p.to_string()).collect()),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}
