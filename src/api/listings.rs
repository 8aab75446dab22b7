use axum::{
    extract::{Extension, Json, Multipart, Path, Query},
    response::{IntoResponse, Response},
};

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::error::ServiceError;
use crate::pagination::PageParameters;
use crate::permissions::{LISTINGS_READ, LISTINGS_WRITE, USERS_MANAGE};
use crate::services::identity::CurrentUser;
use crate::services::listing::{BusinessListingRequest, ListingTierRequest, UploadReport};
use crate::services::media::UploadFile;
use crate::services::Services;

pub async fn all_tiers(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record("listing_tiers", "all_listing_tiers");
    Envelope::from(services.listings.all_tiers().await).into_response()
}

pub async fn paged_tiers(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record("listing_tiers", "paged_listing_tiers");
    PaginatedEnvelope::from_result(services.listings.paged_tiers(&params).await, &params)
        .into_response()
}

pub async fn get_tier(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record_entity("listing_tiers", "get_listing_tier", &id);
    Envelope::from(services.listings.get_tier(&id).await).into_response()
}

// Tier edits are admin-only.
pub async fn create_tier(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ListingTierRequest>,
) -> Response {
    if let Err(denied) = require(&user, USERS_MANAGE) {
        return denied;
    }
    record("listing_tiers", "create_listing_tier");
    Envelope::from(services.listings.create_tier(payload).await).into_response()
}

pub async fn update_tier(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ListingTierRequest>,
) -> Response {
    if let Err(denied) = require(&user, USERS_MANAGE) {
        return denied;
    }
    record("listing_tiers", "update_listing_tier");
    Envelope::from(services.listings.update_tier(payload).await).into_response()
}

pub async fn delete_tier(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, USERS_MANAGE) {
        return denied;
    }
    record_entity("listing_tiers", "delete_listing_tier", &id);
    Envelope::from(services.listings.delete_tier(&id).await).into_response()
}

pub async fn all_listings(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record("business_listings", "all_business_listings");
    Envelope::from(services.listings.all_listings().await).into_response()
}

pub async fn paged_listings(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record("business_listings", "paged_business_listings");
    PaginatedEnvelope::from_result(services.listings.paged_listings(&params).await, &params)
        .into_response()
}

pub async fn get_listing(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_READ) {
        return denied;
    }
    record_entity("business_listings", "get_business_listing", &id);
    Envelope::from(services.listings.get_listing(&id).await).into_response()
}

pub async fn create_listing(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BusinessListingRequest>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_WRITE) {
        return denied;
    }
    record("business_listings", "create_business_listing");
    Envelope::from(
        services
            .listings
            .create_listing(payload, Some(user.id.clone()))
            .await,
    )
    .into_response()
}

pub async fn update_listing(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<BusinessListingRequest>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_WRITE) {
        return denied;
    }
    record("business_listings", "update_business_listing");
    Envelope::from(services.listings.update_listing(payload).await).into_response()
}

pub async fn delete_listing(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_WRITE) {
        return denied;
    }
    record_entity("business_listings", "delete_business_listing", &id);
    Envelope::from(services.listings.delete_listing(&id).await).into_response()
}

/// Every file part of the form is uploaded; other parts are ignored. The
/// reply carries the report even when some files failed.
pub async fn upload_images(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if let Err(denied) = require(&user, LISTINGS_WRITE) {
        return denied;
    }
    record_entity("listing_images", "upload_listing_images", &id);

    let files = match read_files(multipart).await {
        Ok(files) => files,
        Err(e) => return Envelope::<UploadReport>::from(Err(e)).into_response(),
    };
    let cancel = services.shutdown.child_token();
    match services.listings.upload_images(&id, files, cancel).await {
        Ok(report) => {
            let messages: Vec<String> = report
                .failures
                .iter()
                .map(|f| format!("{}: {}", f.file_name, f.message))
                .collect();
            if !messages.is_empty() {
                tracing::Span::current().record("error", "partial_upload");
            }
            Envelope {
                succeeded: messages.is_empty(),
                data: Some(report),
                messages,
            }
            .into_response()
        }
        Err(e) => Envelope::<UploadReport>::from(Err(e)).into_response(),
    }
}

async fn read_files(mut multipart: Multipart) -> Result<Vec<UploadFile>, ServiceError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::validation(format!("Malformed upload: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime_guess::from_path(&file_name).first_or_octet_stream().to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ServiceError::validation(format!("Failed to read {file_name}: {e}")))?;
        files.push(UploadFile {
            file_name,
            content_type,
            data,
        });
    }
    Ok(files)
}
