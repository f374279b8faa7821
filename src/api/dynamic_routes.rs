use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{auth::require_platform_admin, session::AppState};
use crate::error::{AppError, Result};
use crate::models::campaign::Campaign;
use crate::models::dynamic_route::{normalize_code, CreateDynamicRouteData, DynamicRoute};
use crate::services::{qr_generator, short_code};

/// Attempts at finding an unused generated code
const GENERATE_ATTEMPTS: usize = 3;

#[derive(Debug, Deserialize)]
pub struct CreateDynamicRouteRequest {
    pub code: Option<String>,
    pub target_slug: String,
}

/// A route together with the public link it answers on
#[derive(Debug, Serialize)]
pub struct DynamicRouteResponse {
    #[serde(flatten)]
    pub route: DynamicRoute,
    pub link: String,
}

impl DynamicRouteResponse {
    fn new(state: &AppState, route: DynamicRoute) -> Self {
        let link = state.config.dynamic_link(&route.code);
        Self { route, link }
    }
}

async fn list_dynamic_routes(
    State(state): State<AppState>,
) -> Result<Json<Vec<DynamicRouteResponse>>> {
    let routes = DynamicRoute::list(&state.data).await?;

    Ok(Json(
        routes
            .into_iter()
            .map(|route| DynamicRouteResponse::new(&state, route))
            .collect(),
    ))
}

async fn unused_generated_code(state: &AppState) -> Result<String> {
    for _ in 0..GENERATE_ATTEMPTS {
        let code = short_code::generate().map_err(anyhow::Error::from)?;
        if DynamicRoute::find_by_code(&state.data, &code).await?.is_none() {
            return Ok(code);
        }
        tracing::debug!(%code, "Generated code already in use");
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "No unused code found after {} attempts",
        GENERATE_ATTEMPTS
    )))
}

/// Creates a route pointing a short code at an active campaign
async fn create_dynamic_route(
    State(state): State<AppState>,
    Json(req): Json<CreateDynamicRouteRequest>,
) -> Result<(StatusCode, Json<DynamicRouteResponse>)> {
    let target_slug = req.target_slug.trim().to_string();
    Campaign::find_active_by_slug(&state.data, &target_slug)
        .await?
        .ok_or_else(|| {
            AppError::Validation(format!("No active campaign with slug {}", target_slug))
        })?;

    let requested = req
        .code
        .as_deref()
        .map(normalize_code)
        .filter(|code| !code.is_empty());

    let code = match requested {
        Some(code) => {
            short_code::validate(&code).map_err(AppError::Validation)?;
            if DynamicRoute::find_by_code(&state.data, &code).await?.is_some() {
                return Err(AppError::Validation(format!(
                    "Code {} is already in use",
                    code
                )));
            }
            code
        }
        None => unused_generated_code(&state).await?,
    };

    let route = DynamicRoute::create(&state.data, CreateDynamicRouteData { code, target_slug })
        .await?;

    tracing::info!(code = %route.code, target_slug = %route.target_slug, "Dynamic route created");

    Ok((
        StatusCode::CREATED,
        Json(DynamicRouteResponse::new(&state, route)),
    ))
}

/// Switches a route on or off; inactive routes answer with the not-found page
async fn toggle_dynamic_route(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<DynamicRouteResponse>> {
    let not_found = || AppError::NotFound(format!("Dynamic route {} not found", code));

    let current = DynamicRoute::find_by_code(&state.data, &code)
        .await?
        .ok_or_else(not_found)?;

    let route = DynamicRoute::set_active(&state.data, &current.code, !current.is_active)
        .await?
        .ok_or_else(not_found)?;

    tracing::info!(code = %route.code, is_active = route.is_active, "Dynamic route toggled");

    Ok(Json(DynamicRouteResponse::new(&state, route)))
}

async fn existing_link(state: &AppState, code: &str) -> Result<String> {
    let route = DynamicRoute::find_by_code(&state.data, code)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Dynamic route {} not found", code)))?;

    Ok(state.config.dynamic_link(&route.code))
}

/// QR code of a route's public link as SVG
async fn dynamic_route_qr_svg(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response> {
    let link = existing_link(&state, &code).await?;
    let svg = qr_generator::generate_link_svg(&link).map_err(anyhow::Error::from)?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/svg+xml")],
        svg,
    )
        .into_response())
}

/// QR code of a route's public link as PNG
async fn dynamic_route_qr_png(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response> {
    let link = existing_link(&state, &code).await?;
    let png = qr_generator::generate_link_png(&link).map_err(anyhow::Error::from)?;

    Ok((StatusCode::OK, [(header::CONTENT_TYPE, "image/png")], png).into_response())
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/admin/dynamic-routes",
            get(list_dynamic_routes).post(create_dynamic_route),
        )
        .route(
            "/api/admin/dynamic-routes/:code/toggle",
            post(toggle_dynamic_route),
        )
        .route("/admin/dynamic-routes/:code/qr.svg", get(dynamic_route_qr_svg))
        .route("/admin/dynamic-routes/:code/qr.png", get(dynamic_route_qr_png))
        .route_layer(middleware::from_fn_with_state(state, require_platform_admin))
}
