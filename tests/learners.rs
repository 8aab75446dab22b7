mod common;

use schoolhub_server::entities::{learner, learner_parent};
use schoolhub_server::error::ServiceError;
use schoolhub_server::pagination::PageParameters;
use schoolhub_server::services::contact::ContactNumberDto;
use schoolhub_server::services::learner::{LearnerFilter, LearnerRequest};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[tokio::test]
async fn changing_parents_only_touches_the_difference() {
    let (app, _) = common::setup().await;
    let p1 = common::parent(&app.services, "Ayanda").await;
    let p2 = common::parent(&app.services, "Bongani").await;
    let p3 = common::parent(&app.services, "Chloe").await;
    let learner_id = common::learner(&app.services, None, &[&p1, &p2]).await;

    let before = app.services.learners.get(&learner_id).await.unwrap();
    let p2_link = before
        .parents
        .iter()
        .find(|link| link.parent_id == p2)
        .unwrap()
        .link_id
        .clone();

    let after = app
        .services
        .learners
        .update(LearnerRequest {
            id: Some(learner_id.clone()),
            parent_ids: Some(vec![p2.clone(), p3.clone()]),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut linked: Vec<&str> = after.parents.iter().map(|l| l.parent_id.as_str()).collect();
    linked.sort();
    let mut expected = vec![p2.as_str(), p3.as_str()];
    expected.sort();
    assert_eq!(linked, expected);
    let kept = after.parents.iter().find(|l| l.parent_id == p2).unwrap();
    assert_eq!(kept.link_id, p2_link);
    assert_eq!(after.first_name, "Thandi");
}

#[tokio::test]
async fn failed_create_persists_nothing() {
    let (app, _) = common::setup().await;
    let err = app
        .services
        .learners
        .create(LearnerRequest {
            first_name: Some("Sipho".into()),
            last_name: Some("Learner".into()),
            parent_ids: Some(vec!["missing-parent".into()]),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(learner::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(learner_parent::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn create_requires_names() {
    let (app, _) = common::setup().await;
    let err = app
        .services
        .learners
        .create(LearnerRequest::default())
        .await
        .unwrap_err();
    assert_eq!(err.messages().len(), 2);
}

#[tokio::test]
async fn paged_learners_filter_by_grade() {
    let (app, _) = common::setup().await;
    let grade_a = common::grade(&app.services, "Grade 1").await;
    let grade_b = common::grade(&app.services, "Grade 2").await;
    for _ in 0..3 {
        common::learner(&app.services, Some(&grade_a), &[]).await;
    }
    common::learner(&app.services, Some(&grade_b), &[]).await;

    let page = app
        .services
        .learners
        .paged(
            &PageParameters::new(1, 2),
            &LearnerFilter {
                grade_id: Some(grade_a.clone()),
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total_count, 3);
    assert_eq!(page.items.len(), 2);
    assert!(page
        .items
        .iter()
        .all(|l| l.school_grade_id.as_deref() == Some(grade_a.as_str())));
}

#[tokio::test]
async fn contact_numbers_are_synced_by_id() {
    let (app, _) = common::setup().await;
    let learner_id = common::learner(&app.services, None, &[]).await;

    let created = app
        .services
        .learners
        .update(LearnerRequest {
            id: Some(learner_id.clone()),
            contact_numbers: Some(vec![
                ContactNumberDto {
                    id: None,
                    number: "0821234567".into(),
                    is_primary: true,
                },
                ContactNumberDto {
                    id: None,
                    number: "0217654321".into(),
                    is_primary: false,
                },
            ]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(created.contact_numbers.len(), 2);
    let primary = created
        .contact_numbers
        .iter()
        .find(|n| n.is_primary)
        .unwrap()
        .clone();

    let updated = app
        .services
        .learners
        .update(LearnerRequest {
            id: Some(learner_id),
            contact_numbers: Some(vec![ContactNumberDto {
                number: "0830000000".into(),
                ..primary.clone()
            }]),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(updated.contact_numbers.len(), 1);
    assert_eq!(updated.contact_numbers[0].id, primary.id);
    assert_eq!(updated.contact_numbers[0].number, "0830000000");
}

#[tokio::test]
async fn existence_check_by_id_number() {
    let (app, _) = common::setup().await;
    app.services
        .learners
        .create(LearnerRequest {
            first_name: Some("Lerato".into()),
            last_name: Some("Learner".into()),
            id_number: Some("1501015800089".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(app
        .services
        .learners
        .exists_by_id_number("1501015800089")
        .await
        .unwrap());
    assert!(!app.services.learners.exists_by_id_number("000").await.unwrap());
}

#[tokio::test]
async fn deleting_a_learner_drops_parent_links_but_not_parents() {
    let (app, _) = common::setup().await;
    let parent_id = common::parent(&app.services, "Dineo").await;
    let learner_id = common::learner(&app.services, None, &[&parent_id]).await;

    app.services.learners.delete(&learner_id).await.unwrap();

    let links = learner_parent::Entity::find()
        .filter(learner_parent::Column::ParentId.eq(parent_id.as_str()))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(links, 0);
    assert!(app.services.parents.get(&parent_id).await.is_ok());
}
