use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{DataClient, DataError};

const TABLE: &str = "clients";

/// A tenant business
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub admin_pin: String,
    #[serde(skip_serializing)]
    pub staff_pin: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateClientData {
    pub slug: String,
    pub name: String,
    pub admin_pin: String,
    pub staff_pin: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateClientData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_pin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_pin: Option<String>,
}

impl UpdateClientData {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.admin_pin.is_none() && self.staff_pin.is_none()
    }
}

impl Client {
    /// Creates a new client
    pub async fn create(db: &DataClient, data: CreateClientData) -> Result<Self, DataError> {
        db.table(TABLE).insert(&data).await
    }

    /// Finds a client by its URL slug
    pub async fn find_by_slug(db: &DataClient, slug: &str) -> Result<Option<Self>, DataError> {
        db.table(TABLE)
            .select("*")
            .eq("slug", slug)
            .fetch_optional()
            .await
    }

    /// Finds a client by its internal ID
    pub async fn find_by_id(db: &DataClient, id: Uuid) -> Result<Option<Self>, DataError> {
        db.table(TABLE).select("*").eq("id", id).fetch_optional().await
    }

    /// Lists all clients by name
    pub async fn list(db: &DataClient) -> Result<Vec<Self>, DataError> {
        db.table(TABLE).select("*").order_asc("name").fetch_all().await
    }

    /// Updates the provided fields, returning `None` if no client has this ID
    pub async fn update(
        db: &DataClient,
        id: Uuid,
        data: UpdateClientData,
    ) -> Result<Option<Self>, DataError> {
        if data.is_empty() {
            return Self::find_by_id(db, id).await;
        }
        db.table(TABLE).eq("id", id).update(&data).await
    }

    /// Hard-deletes a client. Dependent campaigns are removed by the store's
    /// foreign-key cascade.
    pub async fn delete(db: &DataClient, id: Uuid) -> Result<bool, DataError> {
        let removed = db.table(TABLE).eq("id", id).delete().await?;
        Ok(removed > 0)
    }
}

/// Checks a new or changed slug: lowercase letters, digits and dashes.
pub fn validate_slug(slug: &str) -> Result<(), String> {
    if slug.is_empty() || slug.len() > 64 {
        return Err("Slug must be between 1 and 64 characters".to_string());
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err("Slug cannot start or end with a dash".to_string());
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Slug may only contain lowercase letters, digits and dashes".to_string());
    }
    Ok(())
}

/// Checks a PIN: 4 to 8 digits.
pub fn validate_pin(pin: &str) -> Result<(), String> {
    if !(4..=8).contains(&pin.len()) || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err("PIN must be 4 to 8 digits".to_string());
    }
    Ok(())
}
