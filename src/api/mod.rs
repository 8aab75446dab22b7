//! HTTP controllers. Each handler checks its permission, tags the request
//! span and hands off to one service call. Domain outcomes are always 200
//! with an envelope.

pub mod activities;
pub mod auth;
pub mod communication;
pub mod discipline;
pub mod envelope;
pub mod events;
pub mod learners;
pub mod listings;
pub mod middleware;
pub mod parents;
pub mod school_grades;

pub use envelope::{Envelope, PaginatedEnvelope};

pub(crate) fn record(table: &str, action: &str) {
    tracing::Span::current()
        .record("table", table)
        .record("action", action);
}

pub(crate) fn record_entity(table: &str, action: &str, entity_id: &str) {
    tracing::Span::current()
        .record("table", table)
        .record("action", action)
        .record("entity_id", entity_id);
}
