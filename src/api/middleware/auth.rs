use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use ring::constant_time;
use secrecy::ExposeSecret;
use tower_sessions::Session;

use super::session::{AppState, SESSION_KEY_PLATFORM_ADMIN};
use crate::services::auth::{grant_key, Grant, Role};

/// Authentication error responses
#[derive(Debug)]
pub enum AuthError {
    /// No valid grant for this business; send the user to its PIN form
    LoginRequired(String),
    /// No platform admin session on an HTML admin page
    AdminLoginRequired,
    Forbidden,
    Unauthorized,
    SessionError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::LoginRequired(slug) => {
                Redirect::to(&format!("/login/{}", slug)).into_response()
            }
            AuthError::AdminLoginRequired => Redirect::to("/admin/login").into_response(),
            AuthError::Forbidden => (
                StatusCode::FORBIDDEN,
                "This area is not available with your access level.",
            )
                .into_response(),
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required. Please log in.",
            )
                .into_response(),
            AuthError::SessionError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Session error occurred.").into_response()
            }
        }
    }
}

/// Returns the grant for `slug` if it is unexpired and opens an area
/// requiring `required`.
pub async fn require_grant(
    session: &Session,
    slug: &str,
    required: Role,
) -> Result<Grant, AuthError> {
    let grant: Grant = session
        .get(&grant_key(slug))
        .await
        .map_err(|_| AuthError::SessionError)?
        .ok_or_else(|| AuthError::LoginRequired(slug.to_string()))?;

    if !grant.is_valid_at(Utc::now()) {
        tracing::debug!(slug, "Grant expired");
        return Err(AuthError::LoginRequired(slug.to_string()));
    }

    if !grant.permits(required) {
        tracing::warn!(slug, role = %grant.role, required = %required, "Grant does not permit area");
        return Err(AuthError::Forbidden);
    }

    Ok(grant)
}

/// Middleware that requires a platform administrator, either through a
/// bearer token or a session flag set by the admin login form
pub async fn require_platform_admin(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = bearer {
        if admin_token_matches(&state, token) {
            return Ok(next.run(request).await);
        }
        return Err(AuthError::Unauthorized);
    }

    let is_admin: Option<bool> = session
        .get(SESSION_KEY_PLATFORM_ADMIN)
        .await
        .map_err(|_| AuthError::SessionError)?;

    if is_admin != Some(true) {
        if request.uri().path().starts_with("/api/") {
            return Err(AuthError::Unauthorized);
        }
        return Err(AuthError::AdminLoginRequired);
    }

    Ok(next.run(request).await)
}

/// Compares a presented token with the configured admin token
pub fn admin_token_matches(state: &AppState, presented: &str) -> bool {
    let expected = state.config.admin_token.expose_secret();
    !expected.is_empty()
        && constant_time::verify_slices_are_equal(expected.as_bytes(), presented.as_bytes())
            .is_ok()
}
