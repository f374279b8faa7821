use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DataClient, DataError};
use crate::models::campaign::CampaignConfig;

const TABLE: &str = "passes";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pass {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub serial_number: String,
    #[serde(default)]
    pub current_state: PassState,
    pub last_scanned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Holder-visible state stored in the `current_state` JSON column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub stamps: u32,
    pub points: u32,
    pub rewards_earned: u32,
}

/// Owning campaign fields embedded when a pass is looked up for scanning
#[derive(Debug, Clone, Deserialize)]
pub struct PassCampaign {
    pub client_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub config: CampaignConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PassWithCampaign {
    #[serde(flatten)]
    pub pass: Pass,
    #[serde(rename = "campaigns")]
    pub campaign: Option<PassCampaign>,
}

impl Pass {
    /// Finds a pass by serial number together with its campaign
    pub async fn find_by_serial(
        db: &DataClient,
        serial_number: &str,
    ) -> Result<Option<PassWithCampaign>, DataError> {
        db.table(TABLE)
            .select("*,campaigns(client_id,name,config)")
            .eq("serial_number", serial_number)
            .fetch_optional()
            .await
    }

    /// Most recently scanned passes of a campaign
    pub async fn list_recent_by_campaign(
        db: &DataClient,
        campaign_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("campaign_id", campaign_id)
            .order_desc_nulls_last("last_scanned_at")
            .limit(limit)
            .fetch_all()
            .await
    }

    /// Stores the state produced by a scan
    pub async fn record_scan(
        db: &DataClient,
        id: Uuid,
        state: &PassState,
        scanned_at: DateTime<Utc>,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .eq("id", id)
            .update(&serde_json::json!({
                "current_state": state,
                "last_scanned_at": scanned_at,
            }))
            .await
    }
}
