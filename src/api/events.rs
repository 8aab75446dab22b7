use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{EVENTS_CONSENT, EVENTS_READ, EVENTS_WRITE};
use crate::services::identity::CurrentUser;
use crate::services::school_event::{ConsentRequest, ParticipationRequest, SchoolEventRequest};
use crate::services::Services;

const TABLE: &str = "school_events";

pub async fn all(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_READ) {
        return denied;
    }
    record(TABLE, "all_school_events");
    Envelope::from(services.events.all().await).into_response()
}

pub async fn paged(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_READ) {
        return denied;
    }
    record(TABLE, "paged_school_events");
    PaginatedEnvelope::from_result(services.events.paged(&params).await, &params).into_response()
}

pub async fn get(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_READ) {
        return denied;
    }
    record_entity(TABLE, "get_school_event", &id);
    Envelope::from(services.events.get(&id).await).into_response()
}

pub async fn create(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SchoolEventRequest>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_WRITE) {
        return denied;
    }
    record(TABLE, "create_school_event");
    Envelope::from(services.events.create(payload).await).into_response()
}

pub async fn update(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SchoolEventRequest>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_WRITE) {
        return denied;
    }
    record(TABLE, "update_school_event");
    Envelope::from(services.events.update(payload).await).into_response()
}

pub async fn delete(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_WRITE) {
        return denied;
    }
    record_entity(TABLE, "delete_school_event", &id);
    Envelope::from(services.events.delete(&id).await).into_response()
}

pub async fn activity_groups(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_READ) {
        return denied;
    }
    record_entity("participating_activity_groups", "event_activity_groups", &id);
    Envelope::from(services.events.activity_groups(&id).await).into_response()
}

pub async fn add_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ParticipationRequest>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_WRITE) {
        return denied;
    }
    record_entity("participating_activity_groups", "add_activity_group", &id);
    Envelope::from(services.events.add_activity_group(&id, payload).await).into_response()
}

pub async fn remove_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path((id, group_id)): Path<(String, String)>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_WRITE) {
        return denied;
    }
    record_entity("participating_activity_groups", "remove_activity_group", &id);
    Envelope::from(services.events.remove_activity_group(&id, &group_id).await).into_response()
}

pub async fn permissions(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_READ) {
        return denied;
    }
    record_entity("parent_permissions", "event_permissions", &id);
    Envelope::from(services.events.permissions(&id).await).into_response()
}

pub async fn record_permission(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    Json(payload): Json<ConsentRequest>,
) -> Response {
    if let Err(denied) = require(&user, EVENTS_CONSENT) {
        return denied;
    }
    record_entity("parent_permissions", "record_permission", &id);
    Envelope::from(services.events.record_permission(&id, payload).await).into_response()
}
