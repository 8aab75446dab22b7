use axum::{
    extract::{Extension, Json, Path, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use super::middleware::require;
use super::{record, record_entity, Envelope, PaginatedEnvelope};
use crate::pagination::PageParameters;
use crate::permissions::{COMMUNICATION_READ, COMMUNICATION_WRITE};
use crate::services::communication::MessageRequest;
use crate::services::identity::CurrentUser;
use crate::services::Services;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityQuery {
    #[serde(default, alias = "EntityId")]
    entity_id: String,
}

pub async fn notification_list(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<PageParameters>,
    Query(query): Query<EntityQuery>,
) -> Response {
    if let Err(denied) = require(&user, COMMUNICATION_READ) {
        return denied;
    }
    record_entity("notifications", "notification_list", &query.entity_id);
    PaginatedEnvelope::from_result(
        services
            .communication
            .notifications_for(&query.entity_id, &params)
            .await,
        &params,
    )
    .into_response()
}

pub async fn delete_notification(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, COMMUNICATION_WRITE) {
        return denied;
    }
    record_entity("notifications", "delete_notification", &id);
    Envelope::from(services.communication.delete_notification(&id).await).into_response()
}

pub async fn create_message(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<MessageRequest>,
) -> Response {
    if let Err(denied) = require(&user, COMMUNICATION_WRITE) {
        return denied;
    }
    record("messages", "create_message");
    Envelope::from(
        services
            .communication
            .create_message(payload, Some(user.id.clone()))
            .await,
    )
    .into_response()
}

pub async fn messages_for(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(entity_id): Path<String>,
) -> Response {
    if let Err(denied) = require(&user, COMMUNICATION_READ) {
        return denied;
    }
    record_entity("messages", "entity_messages", &entity_id);
    Envelope::from(services.communication.messages_for(&entity_id).await).into_response()
}
