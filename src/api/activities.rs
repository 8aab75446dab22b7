//! Teachers, age groups and activity groups.

use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{SCHOOL_READ, SCHOOL_WRITE};
use crate::services::activity::{ActivityGroupRequest, AgeGroupRequest, TeacherRequest};
use crate::services::identity::CurrentUser;
use crate::services::Services;

pub async fn all_teachers(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("teachers", "all_teachers");
    Envelope::from(services.activities.all_teachers().await).into_response()
}

pub async fn paged_teachers(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("teachers", "paged_teachers");
    PaginatedEnvelope::from_result(services.activities.paged_teachers(&params).await, &params)
        .into_response()
}

pub async fn get_teacher(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity("teachers", "get_teacher", &id);
    Envelope::from(services.activities.get_teacher(&id).await).into_response()
}

pub async fn create_teacher(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<TeacherRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("teachers", "create_teacher");
    Envelope::from(services.activities.create_teacher(payload).await).into_response()
}

pub async fn update_teacher(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<TeacherRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("teachers", "update_teacher");
    Envelope::from(services.activities.update_teacher(payload).await).into_response()
}

pub async fn delete_teacher(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity("teachers", "delete_teacher", &id);
    Envelope::from(services.activities.delete_teacher(&id).await).into_response()
}

pub async fn all_age_groups(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("age_groups", "all_age_groups");
    Envelope::from(services.activities.all_age_groups().await).into_response()
}

pub async fn paged_age_groups(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("age_groups", "paged_age_groups");
    PaginatedEnvelope::from_result(services.activities.paged_age_groups(&params).await, &params)
        .into_response()
}

pub async fn get_age_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity("age_groups", "get_age_group", &id);
    Envelope::from(services.activities.get_age_group(&id).await).into_response()
}

pub async fn create_age_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AgeGroupRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("age_groups", "create_age_group");
    Envelope::from(services.activities.create_age_group(payload).await).into_response()
}

pub async fn update_age_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<AgeGroupRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("age_groups", "update_age_group");
    Envelope::from(services.activities.update_age_group(payload).await).into_response()
}

pub async fn delete_age_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity("age_groups", "delete_age_group", &id);
    Envelope::from(services.activities.delete_age_group(&id).await).into_response()
}

pub async fn all_activity_groups(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("activity_groups", "all_activity_groups");
    Envelope::from(services.activities.all_activity_groups().await).into_response()
}

pub async fn paged_activity_groups(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record("activity_groups", "paged_activity_groups");
    PaginatedEnvelope::from_result(
        services.activities.paged_activity_groups(&params).await,
        &params,
    )
    .into_response()
}

pub async fn get_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_READ) {
        return denied;
    }
    record_entity("activity_groups", "get_activity_group", &id);
    Envelope::from(services.activities.get_activity_group(&id).await).into_response()
}

pub async fn create_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ActivityGroupRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("activity_groups", "create_activity_group");
    Envelope::from(services.activities.create_activity_group(payload).await).into_response()
}

pub async fn update_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<ActivityGroupRequest>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record("activity_groups", "update_activity_group");
    Envelope::from(services.activities.update_activity_group(payload).await).into_response()
}

pub async fn delete_activity_group(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, SCHOOL_WRITE) {
        return denied;
    }
    record_entity("activity_groups", "delete_activity_group", &id);
    Envelope::from(services.activities.delete_activity_group(&id).await).into_response()
}
