use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tower_sessions::{Expiry, Session};

use crate::api::middleware::auth::admin_token_matches;
use crate::api::middleware::session::{AppState, SESSION_KEY_PLATFORM_ADMIN};
use crate::api::NotFoundTemplate;
use crate::db::DataError;
use crate::models::Client;
use crate::services::auth::{grant_key, verify_pin, Grant};

/// Latest expiry among the grants held by a session
const SESSION_KEY_GRANTS_UNTIL: &str = "grants_until";

#[derive(Debug)]
pub enum AuthError {
    DataError(DataError),
    SessionError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::DataError(e) => {
                tracing::error!(error = %e, "Data service error during login");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Sign in is temporarily unavailable".to_string(),
                )
            }
            AuthError::SessionError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Session error: {}", msg),
            ),
        };

        (status, message).into_response()
    }
}

fn session_error(e: tower_sessions::session::Error) -> AuthError {
    AuthError::SessionError(e.to_string())
}

#[derive(Template)]
#[template(path = "home.html")]
struct HomeTemplate;

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    business_name: String,
    slug: String,
    error: Option<String>,
}

#[derive(Template)]
#[template(path = "admin/login.html")]
struct AdminLoginTemplate {
    error: Option<String>,
}

/// Shows the landing page
async fn home_page() -> HomeTemplate {
    HomeTemplate
}

/// Shows the PIN form of a business
async fn login_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, AuthError> {
    let client = Client::find_by_slug(&state.data, &slug)
        .await
        .map_err(AuthError::DataError)?;

    let Some(client) = client else {
        return Ok((
            StatusCode::NOT_FOUND,
            NotFoundTemplate::new("Business not found"),
        )
            .into_response());
    };

    Ok(LoginTemplate {
        business_name: client.name,
        slug: client.slug,
        error: None,
    }
    .into_response())
}

#[derive(Deserialize)]
struct PinForm {
    pin: String,
}

/// Verifies a PIN and stores the resulting grant in the session
async fn login(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    Form(form): Form<PinForm>,
) -> Result<Response, AuthError> {
    let client = Client::find_by_slug(&state.data, &slug)
        .await
        .map_err(AuthError::DataError)?;

    let Some(client) = client else {
        tracing::info!(%slug, "Login attempt for unknown business");
        return Ok((
            StatusCode::NOT_FOUND,
            LoginTemplate {
                business_name: slug.clone(),
                slug,
                error: Some("Business not found".to_string()),
            },
        )
            .into_response());
    };

    let Some(role) = verify_pin(&client, &form.pin) else {
        tracing::warn!(%slug, "Invalid PIN submitted");
        return Ok((
            StatusCode::UNAUTHORIZED,
            LoginTemplate {
                business_name: client.name,
                slug,
                error: Some("Invalid PIN".to_string()),
            },
        )
            .into_response());
    };

    let now = Utc::now();
    let grant = Grant::issue(role, now);

    // A grant for another business may outlive this one
    let held_until: Option<DateTime<Utc>> = session
        .get(SESSION_KEY_GRANTS_UNTIL)
        .await
        .map_err(session_error)?;
    let session_until = match held_until {
        Some(until) if until > grant.expires_at => until,
        _ => grant.expires_at,
    };

    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(&grant_key(&slug), &grant)
        .await
        .map_err(session_error)?;
    session
        .insert(SESSION_KEY_GRANTS_UNTIL, session_until)
        .await
        .map_err(session_error)?;
    session.set_expiry(Some(Expiry::OnInactivity(time::Duration::seconds(
        (session_until - now).num_seconds(),
    ))));

    tracing::info!(%slug, %role, expires_at = %grant.expires_at, "Business login succeeded");

    Ok(Redirect::to(&role.home_path(&slug)).into_response())
}

/// Drops the grant for one business
async fn logout(Path(slug): Path<String>, session: Session) -> Result<Redirect, AuthError> {
    session
        .remove::<Grant>(&grant_key(&slug))
        .await
        .map_err(session_error)?;

    tracing::info!(%slug, "Business logout");

    Ok(Redirect::to(&format!("/login/{}", slug)))
}

async fn admin_login_page() -> AdminLoginTemplate {
    AdminLoginTemplate { error: None }
}

#[derive(Deserialize)]
struct AdminLoginForm {
    token: String,
}

async fn admin_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AdminLoginForm>,
) -> Result<Response, AuthError> {
    if !admin_token_matches(&state, form.token.trim()) {
        tracing::warn!("Invalid admin token submitted");
        return Ok((
            StatusCode::UNAUTHORIZED,
            AdminLoginTemplate {
                error: Some("Invalid token".to_string()),
            },
        )
            .into_response());
    }

    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(SESSION_KEY_PLATFORM_ADMIN, true)
        .await
        .map_err(session_error)?;

    tracing::info!("Platform admin signed in");

    Ok(Redirect::to("/admin/clients").into_response())
}

async fn admin_logout(session: Session) -> Result<Redirect, AuthError> {
    session
        .remove::<bool>(SESSION_KEY_PLATFORM_ADMIN)
        .await
        .map_err(session_error)?;

    Ok(Redirect::to("/admin/login"))
}

/// Creates the auth router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home_page))
        .route("/login/:slug", get(login_page).post(login))
        .route("/logout/:slug", get(logout))
        .route("/admin/login", get(admin_login_page).post(admin_login))
        .route("/admin/logout", post(admin_logout))
}
