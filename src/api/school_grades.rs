use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{SCHOOL_READ, SCHOOL_WRITE};
use crate::services::identity::CurrentUser;
use crate::services::school_grade::SchoolGradeRequest;
use crate::services::Services;

const TABLE: &str = "school_grades";

pub async fn all(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record(TABLE, "all_school_grades");
    Envelope::from(services.school_grades.all().await).into_response()
}

pub async fn paged(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record(TABLE, "paged_school_grades");
    PaginatedEnvelope::from_result(services.school_grades.paged(&params).await, &params)
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
    record_entity(TABLE, "get_school_grade", &id);
    Envelope::from(services.school_grades.get(&id).await).into_response()
}

pub async fn create(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SchoolGradeRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "create_school_grade");
    Envelope::from(services.school_grades.create(payload).await).into_response()
}

pub async fn update(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<SchoolGradeRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record(TABLE, "update_school_grade");
    Envelope::from(services.school_grades.update(payload).await).into_response()
}

pub async fn delete(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity(TABLE, "delete_school_grade", &id);
    Envelope::from(services.school_grades.delete(&id).await).into_response()
}
