mod common;

use schoolhub_server::entities::{message, notification};
use schoolhub_server::error::ServiceError;
use schoolhub_server::notifications::{DbNotificationSender, NewNotification, NotificationSender};
use schoolhub_server::pagination::PageParameters;
use schoolhub_server::services::communication::MessageRequest;
use schoolhub_server::services::school_grade::SchoolGradeRequest;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn paged_grades_never_exceed_the_page_size() {
    let (app, _) = common::setup().await;
    for i in 1..=7 {
        common::grade(&app.services, &format!("Grade {i}")).await;
    }

    let first = app
        .services
        .school_grades
        .paged(&PageParameters::new(1, 3))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 3);
    assert_eq!(first.total_count, 7);
    assert_eq!(first.items[0].name, "Grade 1");

    let last = app
        .services
        .school_grades
        .paged(&PageParameters::new(3, 3))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 1);
    assert!(last.total_count >= last.items.len() as u64);

    let searched = app
        .services
        .school_grades
        .paged(&PageParameters::new(1, 10).with_search("grade 7"))
        .await
        .unwrap();
    assert_eq!(searched.total_count, 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let (app, _) = common::setup().await;
    for name in ["Top 50% club", "Grade 500", "Grade_1", "Grade 1"] {
        common::grade(&app.services, name).await;
    }

    let percent = app
        .services
        .school_grades
        .paged(&PageParameters::new(1, 10).with_search("50%"))
        .await
        .unwrap();
    assert_eq!(percent.total_count, 1);
    assert_eq!(percent.items[0].name, "Top 50% club");

    let underscore = app
        .services
        .school_grades
        .paged(&PageParameters::new(1, 10).with_search("grade_"))
        .await
        .unwrap();
    assert_eq!(underscore.total_count, 1);
    assert_eq!(underscore.items[0].name, "Grade_1");
}

#[tokio::test]
async fn invalid_page_parameters_are_rejected() {
    let (app, _) = common::setup().await;
    let err = app
        .services
        .school_grades
        .paged(&PageParameters::new(0, 0))
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation(messages) => assert_eq!(messages.len(), 2),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn missing_grade_is_reported_by_id() {
    let (app, _) = common::setup().await;
    let err = app.services.school_grades.get("nope").await.unwrap_err();
    assert_eq!(err.messages(), vec!["School grade with id nope was not found"]);

    let err = app
        .services
        .school_grades
        .update(SchoolGradeRequest {
            id: Some("nope".into()),
            name: Some("Grade 9".into()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
}

#[tokio::test]
async fn deleting_a_grade_removes_its_notifications_and_messages() {
    let (app, _) = common::setup().await;
    let grade_id = common::grade(&app.services, "Grade 4").await;
    let other_id = common::grade(&app.services, "Grade 5").await;

    let notifier = DbNotificationSender::new(app.db.clone());
    for n in 0..3 {
        notifier
            .enqueue(NewNotification {
                entity_id: grade_id.clone(),
                title: format!("Notice {n}"),
                message: "Swimming gala moved".into(),
                recipients: Vec::new(),
            })
            .await
            .unwrap();
    }
    for (entity, subject) in [(&grade_id, "a"), (&grade_id, "b"), (&other_id, "c")] {
        app.services
            .communication
            .create_message(
                MessageRequest {
                    entity_id: Some(entity.clone()),
                    subject: Some(subject.into()),
                    body: Some("hello".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
    }

    app.services.school_grades.delete(&grade_id).await.unwrap();

    let notifications = notification::Entity::find()
        .filter(notification::Column::EntityId.eq(grade_id.as_str()))
        .count(&app.db)
        .await
        .unwrap();
    let messages = message::Entity::find()
        .filter(message::Column::EntityId.eq(grade_id.as_str()))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!((notifications, messages), (0, 0));
    assert_eq!(message::Entity::find().count(&app.db).await.unwrap(), 1);
    assert!(matches!(
        app.services.school_grades.get(&grade_id).await,
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn failed_cleanup_keeps_the_grade() {
    let (app, _) = common::setup().await;
    let grade_id = common::grade(&app.services, "Grade 6").await;
    app.db
        .execute_unprepared("DROP TABLE messages")
        .await
        .unwrap();

    let err = app.services.school_grades.delete(&grade_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Persistence(_)));
    assert_eq!(app.services.school_grades.get(&grade_id).await.unwrap().name, "Grade 6");
}

#[tokio::test]
async fn learners_outlive_their_grade() {
    let (app, _) = common::setup().await;
    let grade_id = common::grade(&app.services, "Grade 2").await;
    let learner_id = common::learner(&app.services, Some(&grade_id), &[]).await;

    app.services.school_grades.delete(&grade_id).await.unwrap();

    let learner = app.services.learners.get(&learner_id).await.unwrap();
    assert_eq!(learner.school_grade_id, None);
}

#[tokio::test]
async fn deleting_an_unknown_grade_is_not_found() {
    let (app, _) = common::setup().await;
    let err = app.services.school_grades.delete("ghost").await.unwrap_err();
    assert_eq!(err.messages(), vec!["School grade with id ghost was not found"]);
}
