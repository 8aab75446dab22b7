mod common;

use std::sync::Arc;

use schoolhub_server::entities::{disciplinary_incident, learner_parent};
use schoolhub_server::error::ServiceError;
use schoolhub_server::services::discipline::{
    DisciplinaryActionRequest, IncidentRequest, SeverityScaleRequest,
};
use schoolhub_server::services::Services;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

async fn action(services: &Services) -> String {
    let scale = services
        .discipline
        .create_scale(SeverityScaleRequest {
            name: Some("Minor".into()),
            score: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    services
        .discipline
        .create_action(DisciplinaryActionRequest {
            name: Some("Detention".into()),
            severity_scale_id: Some(scale.id),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn incident(learner_id: &str, action_id: &str) -> IncidentRequest {
    IncidentRequest {
        learner_id: Some(learner_id.into()),
        disciplinary_action_id: Some(action_id.into()),
        description: Some("Left class without permission".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn incident_without_parents_enqueues_nothing() {
    let (app, sender) = common::setup().await;
    let action_id = action(&app.services).await;
    let learner_id = common::learner(&app.services, None, &[]).await;

    let recorded = app
        .services
        .discipline
        .record_incident(incident(&learner_id, &action_id))
        .await
        .unwrap();

    assert_eq!(recorded.learner_id, learner_id);
    assert!(sender.sent().is_empty());
}

#[tokio::test]
async fn parent_linked_twice_is_notified_once() {
    let (app, sender) = common::setup().await;
    let action_id = action(&app.services).await;
    let parent_id = common::parent(&app.services, "Naledi").await;
    let learner_id = common::learner(&app.services, None, &[&parent_id]).await;
    learner_parent::ActiveModel {
        id: Set("duplicate-link".into()),
        learner_id: Set(learner_id.clone()),
        parent_id: Set(Some(parent_id.clone())),
    }
    .insert(&app.db)
    .await
    .unwrap();

    let recorded = app
        .services
        .discipline
        .record_incident(incident(&learner_id, &action_id))
        .await
        .unwrap();

    let sent = sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].entity_id, recorded.id);
    assert_eq!(sent[0].recipients.len(), 1);
    assert_eq!(sent[0].recipients[0].parent_id, parent_id);
    assert_eq!(sent[0].title, "Disciplinary incident: Thandi Learner");
    assert!(sent[0].message.contains("Action taken: Detention"));
}

#[tokio::test]
async fn sender_failure_does_not_fail_the_incident() {
    let app = common::setup_with_sender(Arc::new(common::FailingSender)).await;
    let action_id = action(&app.services).await;
    let parent_id = common::parent(&app.services, "Palesa").await;
    let learner_id = common::learner(&app.services, None, &[&parent_id]).await;

    let recorded = app
        .services
        .discipline
        .record_incident(incident(&learner_id, &action_id))
        .await
        .unwrap();

    let stored = disciplinary_incident::Entity::find_by_id(recorded.id)
        .one(&app.db)
        .await
        .unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn incident_for_unknown_learner_is_not_found() {
    let (app, sender) = common::setup().await;
    let action_id = action(&app.services).await;
    let err = app
        .services
        .discipline
        .record_incident(incident("ghost", &action_id))
        .await
        .unwrap_err();
    assert_eq!(err.messages(), vec!["Learner with id ghost was not found"]);
    assert!(sender.sent().is_empty());
    assert_eq!(
        disciplinary_incident::Entity::find().count(&app.db).await.unwrap(),
        0
    );
}

#[tokio::test]
async fn scale_in_use_cannot_be_deleted() {
    let (app, _) = common::setup().await;
    let action_id = action(&app.services).await;
    let scale_id = app
        .services
        .discipline
        .get_action(&action_id)
        .await
        .unwrap()
        .severity_scale_id;

    let err = app.services.discipline.delete_scale(&scale_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert!(app.services.discipline.get_scale(&scale_id).await.is_ok());
}

#[tokio::test]
async fn deleting_an_action_removes_its_incidents() {
    let (app, _) = common::setup().await;
    let action_id = action(&app.services).await;
    let learner_id = common::learner(&app.services, None, &[]).await;
    app.services
        .discipline
        .record_incident(incident(&learner_id, &action_id))
        .await
        .unwrap();

    app.services.discipline.delete_action(&action_id).await.unwrap();

    let remaining = app
        .services
        .discipline
        .incidents_for_learner(&learner_id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}
