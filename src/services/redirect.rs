use crate::db::{DataClient, DataError};
use crate::models::dynamic_route::{normalize_code, DynamicRoute};

/// Outcome of looking up a short code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Forward to this path
    Redirect(String),
    /// Unknown or disabled code, as normalised
    NotFound { code: String },
}

/// Resolves a short code to the start page of its campaign.
#[tracing::instrument(skip(db))]
pub async fn resolve(db: &DataClient, raw_code: &str) -> Result<Resolution, DataError> {
    let code = normalize_code(raw_code);
    let route = DynamicRoute::find_by_code(db, &code).await?;

    let resolution = resolution_for(code, route.as_ref());
    match &resolution {
        Resolution::Redirect(target) => tracing::debug!(%target, "Dynamic route resolved"),
        Resolution::NotFound { code } => tracing::info!(%code, "Dynamic route not found"),
    }

    Ok(resolution)
}

pub fn resolution_for(code: String, route: Option<&DynamicRoute>) -> Resolution {
    match route {
        Some(route) if route.is_active => Resolution::Redirect(start_path(&route.target_slug)),
        _ => Resolution::NotFound { code },
    }
}

/// Public start page of a campaign
pub fn start_path(slug: &str) -> String {
    format!("/start/{}", slug)
}
