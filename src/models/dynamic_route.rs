use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{DataClient, DataError};

const TABLE: &str = "dynamic_routes";

/// A short code that forwards to a campaign's start page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicRoute {
    pub code: String,
    pub target_slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateDynamicRouteData {
    pub code: String,
    pub target_slug: String,
}

/// Canonical form of a code as typed or scanned: trimmed and uppercased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl DynamicRoute {
    pub async fn create(
        db: &DataClient,
        data: CreateDynamicRouteData,
    ) -> Result<Self, DataError> {
        db.table(TABLE)
            .insert(&serde_json::json!({
                "code": normalize_code(&data.code),
                "target_slug": data.target_slug,
                "is_active": true,
            }))
            .await
    }

    /// Looks a code up regardless of case
    pub async fn find_by_code(db: &DataClient, code: &str) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("code", normalize_code(code))
            .fetch_optional()
            .await
    }

    pub async fn list(db: &DataClient) -> Result<Vec<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .order_desc("created_at")
            .fetch_all()
            .await
    }

    pub async fn set_active(
        db: &DataClient,
        code: &str,
        is_active: bool,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .eq("code", normalize_code(code))
            .update(&serde_json::json!({ "is_active": is_active }))
            .await
    }
}
