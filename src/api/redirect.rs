use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};

use crate::api::middleware::session::AppState;
use crate::api::NotFoundTemplate;
use crate::db::DataError;
use crate::models::campaign::Campaign;
use crate::services::redirect::{self, Resolution};

#[derive(Debug)]
pub enum RedirectError {
    DataError(DataError),
}

impl IntoResponse for RedirectError {
    fn into_response(self) -> Response {
        match self {
            RedirectError::DataError(e) => {
                tracing::error!(error = %e, "Data service error while resolving link");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "This link cannot be opened right now",
                )
                    .into_response()
            }
        }
    }
}

#[derive(Template)]
#[template(path = "link_not_found.html")]
struct LinkNotFoundTemplate {
    code: String,
}

#[derive(Template)]
#[template(path = "start.html")]
struct StartTemplate {
    campaign: Campaign,
}

/// Forwards a short code to its campaign's start page
async fn follow_dynamic_link(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, RedirectError> {
    let resolution = redirect::resolve(&state.data, &code)
        .await
        .map_err(RedirectError::DataError)?;

    Ok(match resolution {
        Resolution::Redirect(target) => Redirect::to(&target).into_response(),
        Resolution::NotFound { code } => {
            (StatusCode::NOT_FOUND, LinkNotFoundTemplate { code }).into_response()
        }
    })
}

/// Public start page of a campaign
async fn start_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Response, RedirectError> {
    let campaign = Campaign::find_active_by_slug(&state.data, &slug)
        .await
        .map_err(RedirectError::DataError)?;

    Ok(match campaign {
        Some(campaign) => StartTemplate { campaign }.into_response(),
        None => (
            StatusCode::NOT_FOUND,
            NotFoundTemplate::new("This campaign is not available"),
        )
            .into_response(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/d/:code", get(follow_dynamic_link))
        .route("/start/:slug", get(start_page))
}
