use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::middleware::{auth::require_platform_admin, session::AppState};
use crate::error::{AppError, Result};
use crate::models::push_request::PushRequest;

#[derive(Debug, Deserialize)]
pub struct ListPushRequestsQuery {
    #[serde(rename = "campaignId")]
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct PushRequestList {
    pub requests: Vec<PushRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub success: bool,
}

/// Recent push requests, newest first
async fn list_push_requests(
    State(state): State<AppState>,
    Query(params): Query<ListPushRequestsQuery>,
) -> Result<Json<PushRequestList>> {
    let requests = PushRequest::list_recent(&state.data, params.campaign_id).await?;

    Ok(Json(PushRequestList { requests }))
}

/// An empty body means no reason; anything else must be a JSON object,
/// whatever content type it was sent with.
fn parse_reject_body(body: &[u8]) -> Result<RejectRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(RejectRequest::default());
    }

    serde_json::from_slice(body)
        .map_err(|e| AppError::Validation(format!("Invalid rejection body: {}", e)))
}

/// Rejects a request, replacing any earlier decision
async fn reject_push_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<DecisionResponse>> {
    let body = parse_reject_body(&body)?;
    let reason = body
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    PushRequest::reject(&state.data, id, reason, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Push request not found".to_string()))?;

    tracing::info!(push_request_id = %id, reason, "Push request rejected");

    Ok(Json(DecisionResponse { success: true }))
}

/// Approves a request for delivery
async fn approve_push_request(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DecisionResponse>> {
    PushRequest::approve(&state.data, id, Utc::now())
        .await?
        .ok_or_else(|| AppError::NotFound("Push request not found".to_string()))?;

    tracing::info!(push_request_id = %id, "Push request approved");

    Ok(Json(DecisionResponse { success: true }))
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/admin/push-requests", get(list_push_requests))
        .route(
            "/api/admin/push-requests/:id/reject",
            post(reject_push_request),
        )
        .route(
            "/api/admin/push-requests/:id/approve",
            post(approve_push_request),
        )
        .route_layer(middleware::from_fn_with_state(state, require_platform_admin))
}
