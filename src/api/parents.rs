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
use crate::services::parent::ParentRequest;
use crate::services::Services;

const TABLE: &str = "parents";

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistQuery {
    #[serde(default, alias = "Email")]
    email: String,
}

/// Anonymous: used by the sign-up form before an account exists.
pub async fn exists(
    Extension(services): Extension<Services>,
    Query(query): Query<ExistQuery>,
) -> Response {
    record(TABLE, "parent_exists");
    Envelope::from(services.parents.exists_by_email(&query.email).await).into_response()
}

pub async fn paged(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record(TABLE, "paged_parents");
    PaginatedEnvelope::from_result(services.parents.paged(&params).await, &params).into_response()
}

pub async fn get(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity(TABLE, "get_parent", &id);
    Envelope::from(services.parents.get(&id).await).into_response()
}

pub async fn children(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity(TABLE, "parent_children", &id);
    Envelope::from(services.parents.children(&id).await).into_response()
}

pub async fn create(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ParentRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "create_parent");
    Envelope::from(services.parents.create(payload).await).into_response()
}

pub async fn update(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ParentRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "update_parent");
    Envelope::from(services.parents.update(payload).await).into_response()
}

pub async fn delete(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity(TABLE, "delete_parent", &id);
    Envelope::from(services.parents.delete(&id).await).into_response()
}
