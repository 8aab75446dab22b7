use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{DISCIPLINE_READ, DISCIPLINE_WRITE};
use crate::services::discipline::{DisciplinaryActionRequest, IncidentRequest, SeverityScaleRequest};
use crate::services::identity::CurrentUser;
use crate::services::Services;

pub async fn all_scales(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record("severity_scales", "all_severity_scales");
    Envelope::from(services.discipline.all_scales().await).into_response()
}

pub async fn paged_scales(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record("severity_scales", "paged_severity_scales");
    PaginatedEnvelope::from_result(services.discipline.paged_scales(&params).await, &params)
        .into_response()
}

pub async fn get_scale(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record_entity("severity_scales", "get_severity_scale", &id);
    Envelope::from(services.discipline.get_scale(&id).await).into_response()
}

pub async fn create_scale(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SeverityScaleRequest>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record("severity_scales", "create_severity_scale");
    Envelope::from(services.discipline.create_scale(payload).await).into_response()
}

pub async fn update_scale(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SeverityScaleRequest>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record("severity_scales", "update_severity_scale");
    Envelope::from(services.discipline.update_scale(payload).await).into_response()
}

pub async fn delete_scale(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record_entity("severity_scales", "delete_severity_scale", &id);
    Envelope::from(services.discipline.delete_scale(&id).await).into_response()
}

pub async fn all_actions(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record("disciplinary_actions", "all_disciplinary_actions");
    Envelope::from(services.discipline.all_actions().await).into_response()
}

pub async fn paged_actions(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record("disciplinary_actions", "paged_disciplinary_actions");
    PaginatedEnvelope::from_result(services.discipline.paged_actions(&params).await, &params)
        .into_response()
}

pub async fn get_action(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record_entity("disciplinary_actions", "get_disciplinary_action", &id);
    Envelope::from(services.discipline.get_action(&id).await).into_response()
}

pub async fn create_action(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DisciplinaryActionRequest>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record("disciplinary_actions", "create_disciplinary_action");
    Envelope::from(services.discipline.create_action(payload).await).into_response()
}

pub async fn update_action(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<DisciplinaryActionRequest>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record("disciplinary_actions", "update_disciplinary_action");
    Envelope::from(services.discipline.update_action(payload).await).into_response()
}

pub async fn delete_action(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record_entity("disciplinary_actions", "delete_disciplinary_action", &id);
    Envelope::from(services.discipline.delete_action(&id).await).into_response()
}

pub async fn incidents_for_learner(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(learner_id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_READ) {
        return denied;
    }
    record_entity("disciplinary_incidents", "learner_incidents", &learner_id);
    Envelope::from(services.discipline.incidents_for_learner(&learner_id).await).into_response()
}

pub async fn record_incident(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<IncidentRequest>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record("disciplinary_incidents", "record_incident");
    Envelope::from(services.discipline.record_incident(payload).await).into_response()
}

pub async fn delete_incident(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, DISCIPLINE_WRITE) {
        return denied;
    }
    record_entity("disciplinary_incidents", "delete_incident", &id);
    Envelope::from(services.discipline.delete_incident(&id).await).into_response()
}
