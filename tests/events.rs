mod common;

use chrono::NaiveDate;
use schoolhub_server::entities::participating_activity_group;
use schoolhub_server::error::ServiceError;
use schoolhub_server::services::activity::{ActivityGroupRequest, AgeGroupRequest, TeacherRequest};
use schoolhub_server::services::school_event::{
    ConsentRequest, ParticipationRequest, SchoolEventRequest,
};
use schoolhub_server::services::Services;
use sea_orm::{EntityTrait, PaginatorTrait};

fn at(day: u32) -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 3, day)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap()
}

async fn event(services: &Services, requires_consent: bool) -> String {
    services
        .events
        .create(SchoolEventRequest {
            name: Some("Sports day".into()),
            start_date: Some(at(10)),
            end_date: Some(at(11)),
            requires_consent: Some(requires_consent),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

async fn activity_group(services: &Services) -> String {
    let teacher = services
        .activities
        .create_teacher(TeacherRequest {
            first_name: Some("Musa".into()),
            last_name: Some("Teacher".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    let age_group = services
        .activities
        .create_age_group(AgeGroupRequest {
            name: Some("Juniors".into()),
            min_age: Some(6),
            max_age: Some(9),
            ..Default::default()
        })
        .await
        .unwrap();
    services
        .activities
        .create_activity_group(ActivityGroupRequest {
            name: Some("Athletics".into()),
            age_group_id: Some(age_group.id),
            teacher_id: Some(teacher.id),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn event_end_may_not_precede_start() {
    let (app, _) = common::setup().await;
    let err = app
        .services
        .events
        .create(SchoolEventRequest {
            name: Some("Backwards".into()),
            start_date: Some(at(12)),
            end_date: Some(at(11)),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn a_group_takes_part_in_an_event_once() {
    let (app, _) = common::setup().await;
    let event_id = event(&app.services, false).await;
    let group_id = activity_group(&app.services).await;
    let request = ParticipationRequest {
        activity_group_id: Some(group_id.clone()),
    };

    app.services
        .events
        .add_activity_group(&event_id, request.clone())
        .await
        .unwrap();
    let err = app
        .services
        .events
        .add_activity_group(&event_id, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let groups = app.services.events.activity_groups(&event_id).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].id, group_id);
}

#[tokio::test]
async fn deleting_an_event_withdraws_its_groups() {
    let (app, _) = common::setup().await;
    let event_id = event(&app.services, false).await;
    let group_id = activity_group(&app.services).await;
    app.services
        .events
        .add_activity_group(
            &event_id,
            ParticipationRequest {
                activity_group_id: Some(group_id.clone()),
            },
        )
        .await
        .unwrap();

    app.services.events.delete(&event_id).await.unwrap();

    assert_eq!(
        participating_activity_group::Entity::find()
            .count(&app.db)
            .await
            .unwrap(),
        0
    );
    assert!(app.services.activities.get_activity_group(&group_id).await.is_ok());
}

#[tokio::test]
async fn deleting_a_group_withdraws_it_from_events() {
    let (app, _) = common::setup().await;
    let event_id = event(&app.services, false).await;
    let group_id = activity_group(&app.services).await;
    app.services
        .events
        .add_activity_group(
            &event_id,
            ParticipationRequest {
                activity_group_id: Some(group_id.clone()),
            },
        )
        .await
        .unwrap();

    app.services
        .activities
        .delete_activity_group(&group_id)
        .await
        .unwrap();

    assert!(app
        .services
        .events
        .activity_groups(&event_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn teacher_with_groups_cannot_be_deleted() {
    let (app, _) = common::setup().await;
    let group_id = activity_group(&app.services).await;
    let teacher_id = app
        .services
        .activities
        .get_activity_group(&group_id)
        .await
        .unwrap()
        .teacher_id;

    let err = app
        .services
        .activities
        .delete_teacher(&teacher_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn only_linked_parents_answer_consent() {
    let (app, _) = common::setup().await;
    let event_id = event(&app.services, true).await;
    let linked = common::parent(&app.services, "Refilwe").await;
    let stranger = common::parent(&app.services, "Sam").await;
    let learner_id = common::learner(&app.services, None, &[&linked]).await;

    let err = app
        .services
        .events
        .record_permission(
            &event_id,
            ConsentRequest {
                learner_id: Some(learner_id.clone()),
                parent_id: Some(stranger),
                granted: Some(true),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    for granted in [true, false] {
        app.services
            .events
            .record_permission(
                &event_id,
                ConsentRequest {
                    learner_id: Some(learner_id.clone()),
                    parent_id: Some(linked.clone()),
                    granted: Some(granted),
                },
            )
            .await
            .unwrap();
    }
    let answers = app.services.events.permissions(&event_id).await.unwrap();
    assert_eq!(answers.len(), 1);
    assert!(!answers[0].granted);
}

#[tokio::test]
async fn consent_is_refused_for_events_that_do_not_need_it() {
    let (app, _) = common::setup().await;
    let event_id = event(&app.services, false).await;
    let parent_id = common::parent(&app.services, "Tumi").await;
    let learner_id = common::learner(&app.services, None, &[&parent_id]).await;

    let err = app
        .services
        .events
        .record_permission(
            &event_id,
            ConsentRequest {
                learner_id: Some(learner_id),
                parent_id: Some(parent_id),
                granted: Some(true),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.messages(), vec!["Sports day does not require parental consent"]);
}
