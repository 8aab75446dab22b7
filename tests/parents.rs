mod common;

use chrono::NaiveDate;
use schoolhub_server::entities::{
    contact_number, email_address, emergency_contact, learner, learner_parent, message,
    parent_address, parent_permission,
};
use schoolhub_server::error::ServiceError;
use schoolhub_server::services::communication::MessageRequest;
use schoolhub_server::services::contact::{ContactNumberDto, EmailAddressDto};
use schoolhub_server::services::learner::LearnerRequest;
use schoolhub_server::services::parent::{EmergencyContactDto, ParentAddressDto, ParentRequest};
use schoolhub_server::services::school_event::{ConsentRequest, SchoolEventRequest};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

async fn rows<E: EntityTrait>(db: &DatabaseConnection) -> u64
where
    E::Model: Send + Sync,
{
    E::find().count(db).await.unwrap()
}

#[tokio::test]
async fn deleting_a_parent_removes_everything_it_owns() {
    let (app, _) = common::setup().await;
    let parent = app
        .services
        .parents
        .create(ParentRequest {
            first_name: Some("Lindiwe".into()),
            last_name: Some("Parent".into()),
            addresses: Some(vec![ParentAddressDto {
                id: None,
                line1: "12 Oak Street".into(),
                line2: None,
                city: "Durban".into(),
                postal_code: Some("4001".into()),
            }]),
            emergency_contacts: Some(vec![EmergencyContactDto {
                id: None,
                name: "Gogo".into(),
                relationship: Some("Grandmother".into()),
                contact_number: "0310000000".into(),
            }]),
            contact_numbers: Some(vec![ContactNumberDto {
                id: None,
                number: "0820000000".into(),
                is_primary: true,
            }]),
            email_addresses: Some(vec![EmailAddressDto {
                id: None,
                email: "lindiwe@work.example".into(),
                is_primary: true,
            }]),
            ..Default::default()
        })
        .await
        .unwrap();

    let child = app
        .services
        .learners
        .create(LearnerRequest {
            first_name: Some("Ayo".into()),
            last_name: Some("Learner".into()),
            medical_aid_parent_id: Some(parent.id.clone()),
            parent_ids: Some(vec![parent.id.clone()]),
            contact_numbers: Some(vec![ContactNumberDto {
                id: None,
                number: "0711111111".into(),
                is_primary: true,
            }]),
            ..Default::default()
        })
        .await
        .unwrap();

    let start = NaiveDate::from_ymd_opt(2026, 5, 4)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap();
    let event = app
        .services
        .events
        .create(SchoolEventRequest {
            name: Some("Museum trip".into()),
            start_date: Some(start),
            requires_consent: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();
    app.services
        .events
        .record_permission(
            &event.id,
            ConsentRequest {
                learner_id: Some(child.id.clone()),
                parent_id: Some(parent.id.clone()),
                granted: Some(true),
            },
        )
        .await
        .unwrap();
    app.services
        .communication
        .create_message(
            MessageRequest {
                entity_id: Some(parent.id.clone()),
                subject: Some("Fees".into()),
                body: Some("Statement attached".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(rows::<parent_address::Entity>(&app.db).await, 1);
    assert_eq!(rows::<emergency_contact::Entity>(&app.db).await, 1);
    assert_eq!(rows::<contact_number::Entity>(&app.db).await, 2);
    assert_eq!(rows::<email_address::Entity>(&app.db).await, 1);
    assert_eq!(rows::<learner_parent::Entity>(&app.db).await, 1);
    assert_eq!(rows::<parent_permission::Entity>(&app.db).await, 1);

    app.services.parents.delete(&parent.id).await.unwrap();

    assert_eq!(rows::<parent_address::Entity>(&app.db).await, 0);
    assert_eq!(rows::<emergency_contact::Entity>(&app.db).await, 0);
    assert_eq!(rows::<email_address::Entity>(&app.db).await, 0);
    assert_eq!(rows::<learner_parent::Entity>(&app.db).await, 0);
    assert_eq!(rows::<parent_permission::Entity>(&app.db).await, 0);
    assert_eq!(rows::<message::Entity>(&app.db).await, 0);
    // The learner's own number stays.
    assert_eq!(rows::<contact_number::Entity>(&app.db).await, 1);

    let kept = learner::Entity::find_by_id(child.id.clone())
        .one(&app.db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.medical_aid_parent_id, None);
    assert!(matches!(
        app.services.parents.get(&parent.id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn deleting_an_unknown_parent_is_not_found() {
    let (app, _) = common::setup().await;
    let err = app.services.parents.delete("nobody").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn path_like_ids_are_refused() {
    let (app, _) = common::setup().await;
    let err = app
        .services
        .parents
        .create(ParentRequest {
            id: Some("../parent".into()),
            first_name: Some("Zola".into()),
            last_name: Some("Parent".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}
