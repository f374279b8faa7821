use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DataClient, DataError};

const TABLE: &str = "push_requests";

/// Most rows returned by a single listing
pub const LIST_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PushStatus {
    Pending,
    Approved,
    Rejected,
}

impl PushStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PushStatus::Pending => "pending",
            PushStatus::Approved => "approved",
            PushStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushRequest {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub message: String,
    pub status: PushStatus,
    pub rejection_reason: Option<String>,
    /// When the request was approved or rejected
    #[serde(rename = "approved_at")]
    pub decided_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(
        rename = "campaigns",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub campaign: Option<CampaignSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CampaignSummary {
    pub name: String,
    #[serde(rename = "clients", default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSummary {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatePushRequestData {
    pub campaign_id: Uuid,
    pub message: String,
}

/// Fields written when a decision is recorded
#[derive(Debug, Serialize)]
struct Decision<'a> {
    status: PushStatus,
    rejection_reason: Option<&'a str>,
    approved_at: DateTime<Utc>,
}

impl PushRequest {
    /// Creates a pending request
    pub async fn create(db: &DataClient, data: CreatePushRequestData) -> Result<Self, DataError> {
        db.table(TABLE)
            .insert(&serde_json::json!({
                "campaign_id": data.campaign_id,
                "message": data.message,
                "status": PushStatus::Pending,
            }))
            .await
    }

    /// Lists the most recent requests with their campaign and client names,
    /// optionally restricted to one campaign
    pub async fn list_recent(
        db: &DataClient,
        campaign_id: Option<Uuid>,
    ) -> Result<Vec<Self>, DataError> {
        let mut query = db.table(TABLE).select("*,campaigns(name,clients(name))");
        if let Some(campaign_id) = campaign_id {
            query = query.eq("campaign_id", campaign_id);
        }

        query
            .order_desc("created_at")
            .limit(LIST_LIMIT)
            .fetch_all()
            .await
    }

    /// Lists the most recent requests across one client's campaigns
    pub async fn list_recent_for_client(
        db: &DataClient,
        client_id: Uuid,
    ) -> Result<Vec<Self>, DataError> {
        db.table(TABLE)
            .select("*,campaigns!inner(name,client_id,clients(name))")
            .eq("campaigns.client_id", client_id)
            .order_desc("created_at")
            .limit(LIST_LIMIT)
            .fetch_all()
            .await
    }

    /// Marks a request approved. Any earlier decision is overwritten.
    pub async fn approve(
        db: &DataClient,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, DataError> {
        Self::decide(
            db,
            id,
            Decision {
                status: PushStatus::Approved,
                rejection_reason: None,
                approved_at: at,
            },
        )
        .await
    }

    /// Marks a request rejected. Any earlier decision is overwritten.
    pub async fn reject(
        db: &DataClient,
        id: Uuid,
        reason: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<Option<Self>, DataError> {
        Self::decide(
            db,
            id,
            Decision {
                status: PushStatus::Rejected,
                rejection_reason: reason,
                approved_at: at,
            },
        )
        .await
    }

    async fn decide(
        db: &DataClient,
        id: Uuid,
        decision: Decision<'_>,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE).eq("id", id).update(&decision).await
    }
}
