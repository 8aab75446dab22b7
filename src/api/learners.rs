use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{SCHOOL_READ, SCHOOL_WRITE};
use crate::services::identity::CurrentUser;
use crate::services::learner::{LearnerFilter, LearnerRequest};
use crate::services::Services;

const TABLE: &str = "learners";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistQuery {
    #[serde(default, alias = "IdNumber")]
    id_number: String,
}

pub async fn exists(
    Extension(services): Extension<Services>,
    Query(query): Query<ExistQuery>,
) -> Response {
    record(TABLE, "learner_exists");
    Envelope::from(services.learners.exists_by_id_number(&query.id_number).await).into_response()
}

pub async fn paged(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
    Query(filter): Query<LearnerFilter>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record(TABLE, "paged_learners");
    PaginatedEnvelope::from_result(services.learners.paged(&params, &filter).await, &params)
        .into_response()
}

pub async fn get(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity(TABLE, "get_learner", &id);
    Envelope::from(services.learners.get(&id).await).into_response()
}

pub async fn create(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<LearnerRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "create_learner");
    Envelope::from(services.learners.create(payload).await).into_response()
}

pub async fn update(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<LearnerRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "update_learner");
    Envelope::from(services.learners.update(payload).await).into_response()
}

pub async fn delete(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity(TABLE, "delete_learner", &id);
    Envelope::from(services.learners.delete(&id).await).into_response()
}
