mod common;

use axum::body::Bytes;
use schoolhub_server::entities::{listing_image, listing_product, listing_service};
use schoolhub_server::error::ServiceError;
use schoolhub_server::services::listing::{
    BusinessListingRequest, ListingItemDto, ListingTierRequest,
};
use schoolhub_server::services::media::UploadFile;
use schoolhub_server::services::Services;
use sea_orm::{EntityTrait, PaginatorTrait};
use tokio_util::sync::CancellationToken;

async fn listing(services: &Services, max_images: i32) -> String {
    let tier = services
        .listings
        .create_tier(ListingTierRequest {
            name: Some("Basic".into()),
            price_cents: Some(9900),
            max_images: Some(max_images),
            ..Default::default()
        })
        .await
        .unwrap();
    services
        .listings
        .create_listing(
            BusinessListingRequest {
                tier_id: Some(tier.id),
                name: Some("Corner Bakery".into()),
                products: Some(vec![ListingItemDto {
                    id: None,
                    name: "Bread".into(),
                    description: None,
                    price_cents: 1800,
                }]),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap()
        .id
}

fn png(name: &str, body: &'static [u8]) -> UploadFile {
    UploadFile {
        file_name: name.into(),
        content_type: "image/png".into(),
        data: Bytes::from_static(body),
    }
}

#[tokio::test]
async fn uploads_store_good_files_and_report_bad_ones() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 5).await;

    let report = app
        .services
        .listings
        .upload_images(
            &listing_id,
            vec![
                png("front.png", b"png-bytes"),
                UploadFile {
                    file_name: "menu.pdf".into(),
                    content_type: "application/pdf".into(),
                    data: Bytes::from_static(b"%PDF"),
                },
                png("empty.png", b""),
            ],
            CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(report.uploaded.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report.uploaded[0].url.starts_with("/media/listings/"));

    let stored = app.services.listings.get_listing(&listing_id).await.unwrap();
    assert_eq!(stored.images.len(), 1);
    assert_eq!(stored.products.len(), 1);
}

#[tokio::test]
async fn oversized_files_are_rejected() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 5).await;
    static BIG: [u8; 2048] = [0; 2048];

    let report = app
        .services
        .listings
        .upload_images(
            &listing_id,
            vec![png("huge.png", &BIG)],
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert!(report.uploaded.is_empty());
    assert_eq!(report.failures[0].file_name, "huge.png");
}

#[tokio::test]
async fn tier_limits_the_number_of_images() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 1).await;

    let err = app
        .services
        .listings
        .upload_images(
            &listing_id,
            vec![png("a.png", b"a"), png("b.png", b"b")],
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
    assert_eq!(listing_image::Entity::find().count(&app.db).await.unwrap(), 0);
}

#[tokio::test]
async fn cancelled_upload_stores_nothing() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 3).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = app
        .services
        .listings
        .upload_images(&listing_id, vec![png("a.png", b"a")], cancel)
        .await
        .unwrap();
    assert!(report.uploaded.is_empty());
    assert_eq!(report.failures.len(), 1);
}

#[tokio::test]
async fn tier_in_use_cannot_be_deleted() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 1).await;
    let tier_id = app
        .services
        .listings
        .get_listing(&listing_id)
        .await
        .unwrap()
        .tier_id;

    let err = app.services.listings.delete_tier(&tier_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    app.services.listings.delete_listing(&listing_id).await.unwrap();
    app.services.listings.delete_tier(&tier_id).await.unwrap();
}

#[tokio::test]
async fn listing_ids_cannot_climb_out_of_the_media_root() {
    let (app, _) = common::setup().await;
    let tier = app
        .services
        .listings
        .create_tier(ListingTierRequest {
            name: Some("Basic".into()),
            max_images: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    let escape = format!("escape-{}", uuid::Uuid::new_v4());

    let err = app
        .services
        .listings
        .create_listing(
            BusinessListingRequest {
                id: Some(format!("../../{escape}")),
                tier_id: Some(tier.id),
                name: Some("Sneaky".into()),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    let err = app
        .services
        .listings
        .upload_images(
            &format!("../../{escape}"),
            vec![png("a.png", b"a")],
            CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(!app.media_root.parent().unwrap().join(&escape).exists());
}

#[tokio::test]
async fn deleting_a_listing_removes_its_lines_and_images() {
    let (app, _) = common::setup().await;
    let listing_id = listing(&app.services, 3).await;
    app.services
        .listings
        .update_listing(BusinessListingRequest {
            id: Some(listing_id.clone()),
            services: Some(vec![ListingItemDto {
                id: None,
                name: "Catering".into(),
                description: Some("Events up to 50 people".into()),
                price_cents: 250000,
            }]),
            ..Default::default()
        })
        .await
        .unwrap();
    let report = app
        .services
        .listings
        .upload_images(
            &listing_id,
            vec![png("a.png", b"a"), png("b.png", b"b")],
            CancellationToken::new(),
        )
        .await
        .unwrap();
    assert_eq!(report.uploaded.len(), 2);
    assert_eq!(listing_product::Entity::find().count(&app.db).await.unwrap(), 1);
    assert_eq!(listing_service::Entity::find().count(&app.db).await.unwrap(), 1);

    app.services.listings.delete_listing(&listing_id).await.unwrap();

    assert_eq!(listing_product::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(listing_service::Entity::find().count(&app.db).await.unwrap(), 0);
    assert_eq!(listing_image::Entity::find().count(&app.db).await.unwrap(), 0);
    assert!(matches!(
        app.services.listings.get_listing(&listing_id).await,
        Err(ServiceError::NotFound(_))
    ));
}
