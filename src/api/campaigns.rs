use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{auth::require_platform_admin, session::AppState};
use crate::error::{AppError, Result};
use crate::models::campaign::{Campaign, CampaignConfig, CreateCampaignData};
use crate::models::client::{validate_slug, Client};
use crate::models::pass::Pass;

/// Passes shown per campaign in the admin listing
const RECENT_PASSES: usize = 50;

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub config: CampaignConfig,
}

async fn list_campaigns(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
) -> Result<Json<Vec<Campaign>>> {
    let campaigns = Campaign::list_by_client(&state.data, client_id).await?;
    Ok(Json(campaigns))
}

/// Creates a campaign for a client
async fn create_campaign(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<Campaign>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let slug = req.slug.trim().to_lowercase();
    validate_slug(&slug).map_err(AppError::Validation)?;
    req.config
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Client::find_by_id(&state.data, client_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".to_string()))?;

    let campaign = Campaign::create(
        &state.data,
        CreateCampaignData {
            client_id,
            name: name.to_string(),
            slug,
            config: req.config,
        },
    )
    .await?;

    tracing::info!(campaign_id = %campaign.id, %client_id, slug = %campaign.slug, "Campaign created");

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Replaces a campaign's settings
async fn update_campaign_config(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(config): Json<CampaignConfig>,
) -> Result<Json<Campaign>> {
    config
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let campaign = Campaign::update_config(&state.data, id, &config)
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

    tracing::info!(campaign_id = %id, "Campaign settings updated");

    Ok(Json(campaign))
}

/// Most recently scanned passes of a campaign
async fn list_recent_passes(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Pass>>> {
    let passes = Pass::list_recent_by_campaign(&state.data, id, RECENT_PASSES).await?;
    Ok(Json(passes))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/clients/:id/campaigns",
            get(list_campaigns).post(create_campaign),
        )
        .route("/api/admin/campaigns/:id/config", put(update_campaign_config))
        .route("/api/admin/campaigns/:id/passes", get(list_recent_passes))
        .route_layer(middleware::from_fn_with_state(state, require_platform_admin))
}
