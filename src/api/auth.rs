use axum::{
    extract::{Extension, Json, Path},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use crate::api::envelope::Envelope;
use crate::api::middleware::{bearer_token, require};
use crate::permissions;
use crate::services::identity::{CurrentUser, LoginRequest, RegisterRequest};
use crate::services::Services;

pub async fn register(
    Extension(services): Extension<Services>,
    Json(payload): Json<RegisterRequest>,
) -> Response {
    tracing::Span::current()
        .record("table", "users")
        .record("action", "register_user");
    Envelope::from(services.identity.register(payload).await).into_response()
}

pub async fn login(
    Extension(services): Extension<Services>,
    Json(payload): Json<LoginRequest>,
) -> Response {
    tracing::Span::current()
        .record("table", "users")
        .record("action", "login_user");
    match services.identity.login(payload).await {
        Ok(Some(token)) => Envelope::success(token).into_response(),
        Ok(None) => {
            tracing::Span::current()
                .record("action", "login_user_failed")
                .record("error", "invalid_credentials");
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Invalid email or password"})),
            )
                .into_response()
        }
        Err(e) => Envelope::<()>::from(Err(e)).into_response(),
    }
}

pub async fn logout(Extension(services): Extension<Services>, headers: HeaderMap) -> Response {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .unwrap_or_default()
        .to_string();
    Envelope::from(services.identity.logout(&token).await).into_response()
}

pub async fn me(Extension(user): Extension<CurrentUser>) -> Response {
    Json(json!({
        "Id": user.id,
        "Email": user.email,
        "Name": user.name,
        "Role": user.role,
        "Permissions": permissions::for_role(&user.role),
    }))
    .into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RoleRequest {
    #[serde(alias = "role")]
    role: String,
}

pub async fn set_role(
    Extension(services): Extension<Services>,
    Extension(user): Extension<CurrentUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<RoleRequest>,
) -> Response {
    if let Err(denied) = require(&user, permissions::USERS_MANAGE) {
        return denied;
    }
    tracing::Span::current()
        .record("table", "users")
        .record("action", "set_role")
        .record("entity_id", user_id.as_str());
    Envelope::from(services.identity.set_role(&user_id, &payload.role).await).into_response()
}
