use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, Order, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::MediaConfig;
use crate::entities::{business_listing, listing_image, listing_product, listing_service, listing_tier};
use crate::error::{ServiceError, ServiceResult};
use crate::pagination::{Page, PageParameters};
use crate::repository;
use crate::services::communication::purge_entity_references;
use crate::services::media::{self, MediaStore, UploadFailure, UploadFile};
use crate::services::{diff_ids, id_or_new, new_id, now, Checks};
use crate::specification::{FilterSpec, PagedSpec};

const TIER: &str = "Listing tier";
const LISTING: &str = "Business listing";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingTierDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub max_images: i32,
}

impl From<listing_tier::Model> for ListingTierDto {
    fn from(model: listing_tier::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price_cents: model.price_cents,
            max_images: model.max_images,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingTierRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub max_images: Option<i32>,
}

/// A product or service offered on a listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingItemDto {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price_cents: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingImageDto {
    pub id: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub url: String,
}

impl From<listing_image::Model> for ListingImageDto {
    fn from(model: listing_image::Model) -> Self {
        Self {
            id: model.id,
            file_name: model.file_name,
            content_type: model.content_type,
            size_bytes: model.size_bytes,
            url: model.url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListingSummaryDto {
    pub id: String,
    pub tier_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

impl From<business_listing::Model> for ListingSummaryDto {
    fn from(model: business_listing::Model) -> Self {
        Self {
            id: model.id,
            tier_id: model.tier_id,
            name: model.name,
            phone: model.phone,
            email: model.email,
            website: model.website,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusinessListingDto {
    pub id: String,
    pub tier_id: String,
    pub owner_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub products: Vec<ListingItemDto>,
    pub services: Vec<ListingItemDto>,
    pub images: Vec<ListingImageDto>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusinessListingRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub tier_id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub products: Option<Vec<ListingItemDto>>,
    pub services: Option<Vec<ListingItemDto>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UploadReport {
    pub uploaded: Vec<ListingImageDto>,
    pub failures: Vec<UploadFailure>,
}

#[derive(Clone)]
pub struct ListingService {
    db: DatabaseConnection,
    max_page_size: u64,
    media: Arc<dyn MediaStore>,
    media_config: MediaConfig,
}

impl ListingService {
    pub fn new(
        db: DatabaseConnection,
        max_page_size: u64,
        media: Arc<dyn MediaStore>,
        media_config: MediaConfig,
    ) -> Self {
        Self {
            db,
            max_page_size,
            media,
            media_config,
        }
    }

    // Tiers

    pub async fn all_tiers(&self) -> ServiceResult<Vec<ListingTierDto>> {
        let spec = FilterSpec::<listing_tier::Entity>::all()
            .order_by(listing_tier::Column::PriceCents, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(ListingTierDto::from).collect())
    }

    pub async fn paged_tiers(&self, params: &PageParameters) -> ServiceResult<Page<ListingTierDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<listing_tier::Entity>::new(
            params,
            vec![listing_tier::Column::Name, listing_tier::Column::Description],
        )
        .with_default_order(listing_tier::Column::PriceCents, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params).await?.map(ListingTierDto::from))
    }

    pub async fn get_tier(&self, id: &str) -> ServiceResult<ListingTierDto> {
        Ok(repository::get::<listing_tier::Entity, _>(&self.db, id, TIER).await?.into())
    }

    pub async fn create_tier(&self, request: ListingTierRequest) -> ServiceResult<ListingTierDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        let price_cents = request.price_cents.unwrap_or_default();
        let max_images = request.max_images.unwrap_or_default();
        checks.check(price_cents >= 0, "Price may not be negative");
        checks.check(max_images >= 0, "Maximum images may not be negative");
        checks.finish()?;

        let model = listing_tier::ActiveModel {
            id: Set(id_or_new(request.id)?),
            name: Set(name),
            description: Set(request.description),
            price_cents: Set(price_cents),
            max_images: Set(max_images),
        }
        .insert(&self.db)
        .await?;
        crate::metrics::entity_created("listing_tiers");
        Ok(model.into())
    }

    pub async fn update_tier(&self, request: ListingTierRequest) -> ServiceResult<ListingTierDto> {
        let id = request
            .id
            .as_deref()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<listing_tier::Entity, _>(&self.db, id, TIER).await?;
        let mut checks = Checks::default();
        checks.check(request.price_cents.unwrap_or(0) >= 0, "Price may not be negative");
        checks.check(request.max_images.unwrap_or(0) >= 0, "Maximum images may not be negative");
        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(price_cents) = request.price_cents {
            active.price_cents = Set(price_cents);
        }
        if let Some(max_images) = request.max_images {
            active.max_images = Set(max_images);
        }
        Ok(active.update(&self.db).await?.into())
    }

    pub async fn delete_tier(&self, id: &str) -> ServiceResult<()> {
        let tier = repository::get::<listing_tier::Entity, _>(&self.db, id, TIER).await?;
        let listings = business_listing::Entity::find()
            .filter(business_listing::Column::TierId.eq(id))
            .count(&self.db)
            .await?;
        if listings > 0 {
            return Err(ServiceError::validation(format!(
                "Listing tier {} is used by {listings} business listing(s)",
                tier.name
            )));
        }

        let txn = self.db.begin().await?;
        repository::delete_by_id::<listing_tier::Entity, _>(&txn, id).await?;
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;
        crate::metrics::entity_deleted("listing_tiers");
        Ok(())
    }

    // Listings

    pub async fn all_listings(&self) -> ServiceResult<Vec<ListingSummaryDto>> {
        let spec = FilterSpec::<business_listing::Entity>::all()
            .order_by(business_listing::Column::Name, Order::Asc);
        let rows = repository::list(&self.db, &spec).await?;
        Ok(rows.into_iter().map(ListingSummaryDto::from).collect())
    }

    pub async fn paged_listings(
        &self,
        params: &PageParameters,
    ) -> ServiceResult<Page<ListingSummaryDto>> {
        params.validate(self.max_page_size)?;
        let spec = PagedSpec::<business_listing::Entity>::new(
            params,
            vec![
                business_listing::Column::Name,
                business_listing::Column::Description,
            ],
        )
        .with_default_order(business_listing::Column::Name, Order::Asc);
        Ok(repository::paged(&self.db, &spec, params)
            .await?
            .map(ListingSummaryDto::from))
    }

    pub async fn get_listing(&self, id: &str) -> ServiceResult<BusinessListingDto> {
        let model = repository::get::<business_listing::Entity, _>(&self.db, id, LISTING).await?;
        Ok(load_aggregate(&self.db, model).await?)
    }

    pub async fn create_listing(
        &self,
        request: BusinessListingRequest,
        owner_id: Option<String>,
    ) -> ServiceResult<BusinessListingDto> {
        let mut checks = Checks::default();
        let name = checks.required("Name", request.name.as_deref()).to_string();
        let tier_id = checks.required("Tier", request.tier_id.as_deref()).to_string();
        checks.finish()?;
        repository::get::<listing_tier::Entity, _>(&self.db, &tier_id, TIER).await?;

        let id = id_or_new(request.id)?;
        let stamp = now();
        let txn = self.db.begin().await?;
        let model = business_listing::ActiveModel {
            id: Set(id.clone()),
            tier_id: Set(tier_id),
            owner_id: Set(owner_id),
            name: Set(name),
            description: Set(request.description),
            phone: Set(request.phone),
            email: Set(request.email),
            website: Set(request.website),
            created_at: Set(stamp),
            updated_at: Set(stamp),
        }
        .insert(&txn)
        .await?;
        sync_products(&txn, &id, request.products.unwrap_or_default()).await?;
        sync_services(&txn, &id, request.services.unwrap_or_default()).await?;
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;

        crate::metrics::entity_created("business_listings");
        tracing::info!(listing_id = %id, "business listing created");
        Ok(dto)
    }

    pub async fn update_listing(
        &self,
        request: BusinessListingRequest,
    ) -> ServiceResult<BusinessListingDto> {
        let id = request
            .id
            .clone()
            .ok_or_else(|| ServiceError::validation("Id is required"))?;
        let existing = repository::get::<business_listing::Entity, _>(&self.db, &id, LISTING).await?;
        let mut checks = Checks::default();
        let mut active = existing.into_active_model();
        if let Some(name) = request.name.as_deref() {
            active.name = Set(checks.required("Name", Some(name)).to_string());
        }
        checks.finish()?;
        if let Some(tier_id) = request.tier_id {
            repository::get::<listing_tier::Entity, _>(&self.db, &tier_id, TIER).await?;
            active.tier_id = Set(tier_id);
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(phone) = request.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = request.email {
            active.email = Set(Some(email));
        }
        if let Some(website) = request.website {
            active.website = Set(Some(website));
        }
        active.updated_at = Set(now());

        let txn = self.db.begin().await?;
        let model = active.update(&txn).await?;
        if let Some(products) = request.products {
            sync_products(&txn, &id, products).await?;
        }
        if let Some(services) = request.services {
            sync_services(&txn, &id, services).await?;
        }
        let dto = load_aggregate(&txn, model).await?;
        txn.commit().await?;
        Ok(dto)
    }

    /// Products, services and image rows go through the schema's cascade.
    /// Stored image objects are left in the media store.
    pub async fn delete_listing(&self, id: &str) -> ServiceResult<()> {
        let txn = self.db.begin().await?;
        if repository::delete_by_id::<business_listing::Entity, _>(&txn, id).await? == 0 {
            return Err(ServiceError::not_found(LISTING, id));
        }
        purge_entity_references(&txn, &[id.to_string()]).await?;
        txn.commit().await?;

        crate::metrics::entity_deleted("business_listings");
        tracing::info!(listing_id = %id, "business listing deleted");
        Ok(())
    }

    /// Stores a batch of images for a listing. The tier's image allowance is
    /// checked for the whole batch up front; after that each file succeeds or
    /// fails on its own and the report lists both.
    pub async fn upload_images(
        &self,
        listing_id: &str,
        files: Vec<UploadFile>,
        cancel: CancellationToken,
    ) -> ServiceResult<UploadReport> {
        if files.is_empty() {
            return Err(ServiceError::validation("No files were uploaded"));
        }
        let listing =
            repository::get::<business_listing::Entity, _>(&self.db, listing_id, LISTING).await?;
        let tier = repository::get::<listing_tier::Entity, _>(&self.db, &listing.tier_id, TIER).await?;
        let stored_count = listing_image::Entity::find()
            .filter(listing_image::Column::ListingId.eq(listing_id))
            .count(&self.db)
            .await?;
        let allowance = u64::try_from(tier.max_images).unwrap_or(0);
        if stored_count + files.len() as u64 > allowance {
            return Err(ServiceError::validation(format!(
                "The {} tier allows {allowance} image(s); {stored_count} already stored",
                tier.name
            )));
        }

        let mut failures = Vec::new();
        let mut accepted = Vec::new();
        for file in files {
            match self.reject_reason(&file) {
                Some(message) => failures.push(UploadFailure {
                    file_name: file.file_name,
                    message,
                }),
                None => accepted.push(file),
            }
        }

        let (stored, upload_failures) = media::upload_all(
            self.media.clone(),
            &format!("listings/{listing_id}"),
            accepted,
            self.media_config.upload_concurrency,
            cancel,
        )
        .await;
        failures.extend(upload_failures);

        let stamp = now();
        let mut uploaded = Vec::with_capacity(stored.len());
        let mut rows = Vec::with_capacity(stored.len());
        for file in stored {
            let image = ListingImageDto {
                id: new_id(),
                file_name: file.file_name,
                content_type: file.content_type,
                size_bytes: file.size_bytes as i64,
                url: file.url,
            };
            rows.push(listing_image::ActiveModel {
                id: Set(image.id.clone()),
                listing_id: Set(listing_id.to_string()),
                file_name: Set(image.file_name.clone()),
                content_type: Set(image.content_type.clone()),
                size_bytes: Set(image.size_bytes),
                url: Set(image.url.clone()),
                created_at: Set(stamp),
            });
            uploaded.push(image);
        }
        repository::insert_all(&self.db, rows).await?;

        tracing::info!(listing_id = %listing_id, failures = failures.len(), "listing images processed");
        Ok(UploadReport { uploaded, failures })
    }

    fn reject_reason(&self, file: &UploadFile) -> Option<String> {
        if file.data.is_empty() {
            return Some("File is empty".to_string());
        }
        if file.data.len() > self.media_config.max_upload_bytes {
            return Some(format!(
                "File exceeds the {} byte limit",
                self.media_config.max_upload_bytes
            ));
        }
        match file.content_type.parse::<mime::Mime>() {
            Ok(mime) if mime.type_() == mime::IMAGE => None,
            _ => Some(format!("{} is not an image type", file.content_type)),
        }
    }
}

async fn load_aggregate<C: ConnectionTrait>(
    conn: &C,
    model: business_listing::Model,
) -> Result<BusinessListingDto, DbErr> {
    let products = listing_product::Entity::find()
        .filter(listing_product::Column::ListingId.eq(model.id.as_str()))
        .order_by_asc(listing_product::Column::Name)
        .all(conn)
        .await?;
    let services = listing_service::Entity::find()
        .filter(listing_service::Column::ListingId.eq(model.id.as_str()))
        .order_by_asc(listing_service::Column::Name)
        .all(conn)
        .await?;
    let images = listing_image::Entity::find()
        .filter(listing_image::Column::ListingId.eq(model.id.as_str()))
        .order_by_asc(listing_image::Column::CreatedAt)
        .all(conn)
        .await?;

    Ok(BusinessListingDto {
        id: model.id,
        tier_id: model.tier_id,
        owner_id: model.owner_id,
        name: model.name,
        description: model.description,
        phone: model.phone,
        email: model.email,
        website: model.website,
        products: products
            .into_iter()
            .map(|p| ListingItemDto {
                id: Some(p.id),
                name: p.name,
                description: p.description,
                price_cents: p.price_cents,
            })
            .collect(),
        services: services
            .into_iter()
            .map(|s| ListingItemDto {
                id: Some(s.id),
                name: s.name,
                description: s.description,
                price_cents: s.price_cents,
            })
            .collect(),
        images: images.into_iter().map(ListingImageDto::from).collect(),
    })
}

async fn sync_products<C: ConnectionTrait>(
    conn: &C,
    listing_id: &str,
    incoming: Vec<ListingItemDto>,
) -> Result<(), DbErr> {
    let existing = listing_product::Entity::find()
        .filter(listing_product::Column::ListingId.eq(listing_id))
        .all(conn)
        .await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|item| item.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        listing_product::Entity::delete_many()
            .filter(listing_product::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let mut inserts = Vec::new();
    for item in incoming {
        let mut row = listing_product::ActiveModel {
            listing_id: Set(listing_id.to_string()),
            name: Set(item.name),
            description: Set(item.description),
            price_cents: Set(item.price_cents),
            ..Default::default()
        };
        match item.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                row.id = Set(id);
                row.update(conn).await?;
            }
            None => {
                row.id = Set(new_id());
                inserts.push(row);
            }
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}

async fn sync_services<C: ConnectionTrait>(
    conn: &C,
    listing_id: &str,
    incoming: Vec<ListingItemDto>,
) -> Result<(), DbErr> {
    let existing = listing_service::Entity::find()
        .filter(listing_service::Column::ListingId.eq(listing_id))
        .all(conn)
        .await?;
    let diff = diff_ids(
        existing.iter().map(|row| row.id.as_str()),
        incoming.iter().map(|item| item.id.as_deref()),
    );
    if !diff.removed.is_empty() {
        listing_service::Entity::delete_many()
            .filter(listing_service::Column::Id.is_in(diff.removed))
            .exec(conn)
            .await?;
    }

    let mut inserts = Vec::new();
    for item in incoming {
        let mut row = listing_service::ActiveModel {
            listing_id: Set(listing_id.to_string()),
            name: Set(item.name),
            description: Set(item.description),
            price_cents: Set(item.price_cents),
            ..Default::default()
        };
        match item.id.filter(|id| diff.retained.contains(id)) {
            Some(id) => {
                row.id = Set(id);
                row.update(conn).await?;
            }
            None => {
                row.id = Set(new_id());
                inserts.push(row);
            }
        }
    }
    repository::insert_all(conn, inserts).await?;
    Ok(())
}
