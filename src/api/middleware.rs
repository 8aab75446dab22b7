use axum::{
    extract::Request,
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;

use crate::services::identity::CurrentUser;
use crate::services::Services;

/// Resolves `Authorization: Bearer <token>` into a [`CurrentUser`] request
/// extension. Anything else is a 401.
pub async fn auth_middleware(
    Extension(services): Extension<Services>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_string);

    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return unauthorized();
    };

    match services.identity.authenticate(&token).await {
        Ok(Some(user)) => {
            tracing::Span::current()
                .record("user_id", user.id.as_str())
                .record("user_email", user.email.as_str());
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Ok(None) => unauthorized(),
        Err(e) => {
            tracing::error!(error = %e, "token lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Authentication unavailable"})),
            )
                .into_response()
        }
    }
}

/// The credentials of a `Bearer` authorization value. The scheme name is
/// case-insensitive.
pub(crate) fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))).into_response()
}

/// `Err` carries the 403 reply to return as-is.
#[allow(clippy::result_large_err)]
pub fn require(user: &CurrentUser, permission: &str) -> Result<(), Response> {
    if user.has(permission) {
        return Ok(());
    }
    tracing::Span::current().record("error", "forbidden");
    tracing::warn!(user_id = %user.id, role = %user.role, permission, "permission denied");
    Err((
        StatusCode::FORBIDDEN,
        Json(json!({"error": format!("Missing permission {permission}")})),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        assert_eq!(bearer_token("Basic dXNlcjpwdw=="), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearerabc"), None);
    }
}
