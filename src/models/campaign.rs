use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DataClient, DataError};

const TABLE: &str = "campaigns";

const MAX_COOLDOWN_MINUTES: u32 = 7 * 24 * 60;
const MAX_STAMPS_REQUIRED: u32 = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub client_id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub config: CampaignConfig,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    #[default]
    Stamps,
    Points,
    Membership,
}

/// Campaign settings stored in the `config` JSON column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignConfig {
    pub program: ProgramKind,
    /// Minimum minutes between two scans of the same pass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooldown_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stamps_required: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reward: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub welcome_message: Option<String>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be a #RRGGBB colour")]
    InvalidColor { field: &'static str },

    #[error("stamps_required must be between 1 and {MAX_STAMPS_REQUIRED}")]
    StampsOutOfRange,

    #[error("cooldown_minutes cannot exceed {MAX_COOLDOWN_MINUTES}")]
    CooldownTooLong,

    #[error("logo_url must be an absolute http(s) URL")]
    InvalidLogoUrl,
}

impl CampaignConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(color) = &self.background_color {
            if !is_hex_color(color) {
                return Err(ConfigError::InvalidColor {
                    field: "background_color",
                });
            }
        }
        if let Some(color) = &self.foreground_color {
            if !is_hex_color(color) {
                return Err(ConfigError::InvalidColor {
                    field: "foreground_color",
                });
            }
        }
        if let Some(stamps) = self.stamps_required {
            if !(1..=MAX_STAMPS_REQUIRED).contains(&stamps) {
                return Err(ConfigError::StampsOutOfRange);
            }
        }
        if self.cooldown_minutes.unwrap_or(0) > MAX_COOLDOWN_MINUTES {
            return Err(ConfigError::CooldownTooLong);
        }
        if let Some(logo_url) = &self.logo_url {
            match url::Url::parse(logo_url) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => return Err(ConfigError::InvalidLogoUrl),
            }
        }
        Ok(())
    }

    pub fn cooldown(&self) -> Option<chrono::Duration> {
        self.cooldown_minutes
            .filter(|minutes| *minutes > 0)
            .map(|minutes| chrono::Duration::minutes(i64::from(minutes)))
    }
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCampaignData {
    pub client_id: Uuid,
    pub name: String,
    pub slug: String,
    pub config: CampaignConfig,
}

impl Campaign {
    pub async fn create(db: &DataClient, data: CreateCampaignData) -> Result<Self, DataError> {
        db.table(TABLE).insert(&data).await
    }

    pub async fn find_by_id(db: &DataClient, id: Uuid) -> Result<Option<Self>, DataError> {
        db.table(TABLE).select("*").eq("id", id).fetch_optional().await
    }

    /// Finds an active campaign by its public slug
    pub async fn find_active_by_slug(
        db: &DataClient,
        slug: &str,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("slug", slug)
            .eq("is_active", true)
            .fetch_optional()
            .await
    }

    /// Lists a client's campaigns, newest first
    pub async fn list_by_client(db: &DataClient, client_id: Uuid) -> Result<Vec<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("client_id", client_id)
            .order_desc("created_at")
            .fetch_all()
            .await
    }

    /// Replaces the campaign settings
    pub async fn update_config(
        db: &DataClient,
        id: Uuid,
        config: &CampaignConfig,
    ) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .eq("id", id)
            .update(&serde_json::json!({ "config": config }))
            .await
    }
}
