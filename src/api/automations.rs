use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::middleware::{auth::require_platform_admin, session::AppState};
use crate::error::{AppError, Result};
use crate::models::automation::{Automation, AutomationTrigger, CreateAutomationData};
use crate::models::campaign::Campaign;

const MAX_MESSAGE_CHARS: usize = 240;

#[derive(Debug, Deserialize)]
pub struct CreateAutomationRequest {
    pub name: String,
    pub trigger: AutomationTrigger,
    pub message: String,
}

fn not_found() -> AppError {
    AppError::NotFound("Automation not found".to_string())
}

async fn list_automations(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<Vec<Automation>>> {
    let automations = Automation::list_by_campaign(&state.data, campaign_id).await?;
    Ok(Json(automations))
}

/// Attaches a new rule to a campaign
async fn create_automation(
    State(state): State<AppState>,
    Path(campaign_id): Path<Uuid>,
    Json(req): Json<CreateAutomationRequest>,
) -> Result<(StatusCode, Json<Automation>)> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Name is required".to_string()));
    }
    let message = req.message.trim();
    if message.is_empty() || message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message must be between 1 and {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    req.trigger.validate().map_err(AppError::Validation)?;

    Campaign::find_by_id(&state.data, campaign_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Campaign not found".to_string()))?;

    let automation = Automation::create(
        &state.data,
        CreateAutomationData {
            campaign_id,
            name: name.to_string(),
            trigger: req.trigger,
            message: message.to_string(),
        },
    )
    .await?;

    tracing::info!(automation_id = %automation.id, %campaign_id, "Automation created");

    Ok((StatusCode::CREATED, Json(automation)))
}

/// Flips an automation between active and paused
async fn toggle_automation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Automation>> {
    let current = Automation::find_by_id(&state.data, id)
        .await?
        .ok_or_else(not_found)?;

    let automation = Automation::set_active(&state.data, id, !current.is_active)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(automation_id = %id, is_active = automation.is_active, "Automation toggled");

    Ok(Json(automation))
}

async fn delete_automation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    if !Automation::delete(&state.data, id).await? {
        return Err(not_found());
    }

    tracing::info!(automation_id = %id, "Automation deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/campaigns/:id/automations",
            get(list_automations).post(create_automation),
        )
        .route("/api/admin/automations/:id/toggle", post(toggle_automation))
        .route("/api/admin/automations/:id", delete(delete_automation))
        .route_layer(middleware::from_fn_with_state(state, require_platform_admin))
}
