use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DataClient, DataError};

const TABLE: &str = "automations";

/// A notification rule attached to a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub name: String,
    pub trigger: AutomationTrigger,
    pub message: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// What fires an automation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AutomationTrigger {
    /// Pass not scanned for this many days
    Inactivity { days: u32 },
    /// Pass scanned this many times
    VisitCount { visits: u32 },
    RewardEarned,
    Birthday,
}

impl AutomationTrigger {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            AutomationTrigger::Inactivity { days } if !(1..=365).contains(days) => {
                Err("Inactivity trigger needs between 1 and 365 days".to_string())
            }
            AutomationTrigger::VisitCount { visits } if *visits == 0 => {
                Err("Visit count trigger needs at least one visit".to_string())
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateAutomationData {
    pub campaign_id: Uuid,
    pub name: String,
    pub trigger: AutomationTrigger,
    pub message: String,
}

impl Automation {
    pub async fn create(db: &DataClient, data: CreateAutomationData) -> Result<Self, DataError> {
        db.table(TABLE).insert(&data).await
    }

    pub async fn find_by_id(db: &DataClient, id: Uuid) -> Result<Option<Self>, DataError> {
        db.table(TABLE).select("*").eq("id", id).fetch_optional().await
    }

    pub async fn list_by_campaign(
        db: &DataClient,
        campaign_id: Uuid,
    ) -> Result<Vec<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("campaign_id", campaign_id)
            .order_asc("created_at")
            .fetch_all()
            .await
    }

    pub async fn set_active(
        db: &DataClient,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .eq("id", id)
            .update(&serde_json::json!({ "is_active": is_active }))
            .await
    }

    pub async fn delete(db: &DataClient, id: Uuid) -> Result<bool, DataError> {
        let removed = db.table(TABLE).eq("id", id).delete().await?;
        Ok(removed > 0)
    }
}
