use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait};

use crate::entities::{business_listing, learner, parent};

pub async fn init_metrics(db: &DatabaseConnection) {
    let learner_count = learner::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("schoolhub_learners_total").set(learner_count as f64);

    let parent_count = parent::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("schoolhub_parents_total").set(parent_count as f64);

    let listing_count = business_listing::Entity::find().count(db).await.unwrap_or(0);
    metrics::gauge!("schoolhub_business_listings_total").set(listing_count as f64);

    tracing::info!(
        "Initialized metrics: Learners={}, Parents={}, Listings={}",
        learner_count,
        parent_count,
        listing_count
    );
}

pub fn entity_created(table: &'static str) {
    metrics::counter!("schoolhub_entities_created_total", "table" => table).increment(1);
}

pub fn entity_deleted(table: &'static str) {
    metrics::counter!("schoolhub_entities_deleted_total", "table" => table).increment(1);
}

pub fn increment_incidents_recorded() {
    metrics::counter!("schoolhub_incidents_recorded_total").increment(1);
}

pub fn increment_notifications_enqueued() {
    metrics::counter!("schoolhub_notifications_enqueued_total").increment(1);
}

pub fn increment_notifications_skipped() {
    metrics::counter!("schoolhub_notifications_skipped_total").increment(1);
}

pub fn increment_notifications_failed() {
    metrics::counter!("schoolhub_notifications_failed_total").increment(1);
}

pub fn increment_uploads(outcome: &'static str) {
    metrics::counter!("schoolhub_uploads_total", "outcome" => outcome).increment(1);
}
