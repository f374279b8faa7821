use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::api::middleware::{
    auth::{require_grant, AuthError},
    session::AppState,
};
use crate::api::NotFoundTemplate;
use crate::db::DataError;
use crate::models::{
    campaign::Campaign,
    client::Client,
    pass::Pass,
    push_request::{CreatePushRequestData, PushRequest},
};
use crate::services::auth::Role;
use crate::services::scanning::{self, ScanError};

const MAX_MESSAGE_CHARS: usize = 240;

#[derive(Debug)]
pub enum TenantError {
    AuthError(AuthError),
    DataError(DataError),
    NotFound(&'static str),
    ValidationError(String),
}

impl IntoResponse for TenantError {
    fn into_response(self) -> Response {
        match self {
            TenantError::AuthError(e) => e.into_response(),
            TenantError::DataError(e) => {
                tracing::error!(error = %e, "Data service error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong, please try again".to_string(),
                )
                    .into_response()
            }
            TenantError::NotFound(message) => {
                (StatusCode::NOT_FOUND, NotFoundTemplate::new(message)).into_response()
            }
            TenantError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl From<DataError> for TenantError {
    fn from(e: DataError) -> Self {
        TenantError::DataError(e)
    }
}

impl From<AuthError> for TenantError {
    fn from(e: AuthError) -> Self {
        TenantError::AuthError(e)
    }
}

#[derive(Template)]
#[template(path = "tenant/dashboard.html")]
struct DashboardTemplate {
    client: Client,
    campaigns: Vec<Campaign>,
    push_requests: Vec<PushRequest>,
    notice: Option<String>,
    is_admin: bool,
}

#[derive(Template)]
#[template(path = "tenant/pos.html")]
struct PosTemplate {
    client: Client,
    campaigns: Vec<Campaign>,
    result: Option<String>,
    is_error: bool,
    is_admin: bool,
}

async fn load_client(state: &AppState, slug: &str) -> Result<Client, TenantError> {
    Client::find_by_slug(&state.data, slug)
        .await?
        .ok_or(TenantError::NotFound("Business not found"))
}

/// Business admin dashboard
async fn dashboard(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<DashboardTemplate, TenantError> {
    require_grant(&session, &slug, Role::Admin).await?;

    let client = load_client(&state, &slug).await?;
    let campaigns = Campaign::list_by_client(&state.data, client.id).await?;
    let push_requests = PushRequest::list_recent_for_client(&state.data, client.id).await?;

    Ok(DashboardTemplate {
        client,
        campaigns,
        push_requests,
        notice: None,
        is_admin: true,
    })
}

#[derive(Deserialize)]
struct PushRequestForm {
    campaign_id: Uuid,
    message: String,
}

/// Submits a notification blast for platform approval
async fn request_push(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    Form(form): Form<PushRequestForm>,
) -> Result<Redirect, TenantError> {
    require_grant(&session, &slug, Role::Admin).await?;

    let message = form.message.trim();
    if message.is_empty() {
        return Err(TenantError::ValidationError(
            "Message is required".to_string(),
        ));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(TenantError::ValidationError(format!(
            "Message cannot exceed {} characters",
            MAX_MESSAGE_CHARS
        )));
    }

    let client = load_client(&state, &slug).await?;
    let campaign = Campaign::find_by_id(&state.data, form.campaign_id)
        .await?
        .filter(|campaign| campaign.client_id == client.id)
        .ok_or(TenantError::NotFound("Campaign not found"))?;

    let request = PushRequest::create(
        &state.data,
        CreatePushRequestData {
            campaign_id: campaign.id,
            message: message.to_string(),
        },
    )
    .await?;

    tracing::info!(%slug, push_request_id = %request.id, campaign_id = %campaign.id, "Push request submitted");

    Ok(Redirect::to(&format!("/client/{}", slug)))
}

/// Point-of-sale page for staff and admins
async fn pos_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
) -> Result<PosTemplate, TenantError> {
    let grant = require_grant(&session, &slug, Role::Staff).await?;

    let client = load_client(&state, &slug).await?;
    let campaigns = Campaign::list_by_client(&state.data, client.id).await?;

    Ok(PosTemplate {
        client,
        campaigns,
        result: None,
        is_error: false,
        is_admin: grant.role == Role::Admin,
    })
}

#[derive(Deserialize)]
struct ScanForm {
    serial: String,
}

/// Records a visit on a pass
async fn scan_pass(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    Form(form): Form<ScanForm>,
) -> Result<Response, TenantError> {
    let grant = require_grant(&session, &slug, Role::Staff).await?;

    let client = load_client(&state, &slug).await?;
    let campaigns = Campaign::list_by_client(&state.data, client.id).await?;

    let mut page = PosTemplate {
        client,
        campaigns,
        result: None,
        is_error: true,
        is_admin: grant.role == Role::Admin,
    };

    let serial = form.serial.trim();
    let found = Pass::find_by_serial(&state.data, serial).await?;

    // Passes of other businesses are reported as unknown
    let Some((pass, campaign)) = found.and_then(|row| {
        row.campaign
            .filter(|campaign| campaign.client_id == page.client.id)
            .map(|campaign| (row.pass, campaign))
    }) else {
        page.result = Some(format!("Unknown pass {}", serial));
        return Ok((StatusCode::NOT_FOUND, page).into_response());
    };

    let now = Utc::now();
    let outcome = match scanning::apply_scan(&pass, &campaign.config, now) {
        Ok(outcome) => outcome,
        Err(ScanError::CooldownActive(allowed_at)) => {
            tracing::info!(%slug, serial, %allowed_at, "Scan refused during cooldown");
            page.result = Some(format!(
                "Already scanned recently. Next visit can be recorded after {}",
                allowed_at.format("%H:%M UTC")
            ));
            return Ok((StatusCode::CONFLICT, page).into_response());
        }
    };

    Pass::record_scan(&state.data, pass.id, &outcome.state, now).await?;

    tracing::info!(
        %slug,
        serial,
        stamps = outcome.state.stamps,
        reward_unlocked = outcome.reward_unlocked,
        "Pass scanned"
    );

    let holder = outcome
        .state
        .customer_name
        .clone()
        .unwrap_or_else(|| serial.to_string());
    page.result = Some(if outcome.reward_unlocked {
        format!("{}: reward unlocked on {}!", holder, campaign.name)
    } else {
        format!(
            "{}: visit recorded on {} ({} stamps, {} points)",
            holder, campaign.name, outcome.state.stamps, outcome.state.points
        )
    });
    page.is_error = false;

    Ok(page.into_response())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/client/:slug", get(dashboard))
        .route("/client/:slug/push-requests", post(request_push))
        .route("/pos/:slug", get(pos_page))
        .route("/pos/:slug/scan", post(scan_pass))
}
