//! Client for the hosted data service's REST data API.
//!
//! Tables are addressed as `<project>/rest/v1/<table>` and filtered with
//! query parameters (`slug=eq.acme`, `order=created_at.desc`, `limit=50`).
//! Every request carries the project's anonymous key both as `apikey` and as
//! a bearer token.

use std::fmt::Display;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(thiserror::Error, Debug)]
pub enum DataError {
    #[error("Invalid data service URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Data API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("Write to {0} returned no rows")]
    NoRowsReturned(String),

    #[error("Refusing to {0} without a filter")]
    MissingFilter(&'static str),
}

/// Error body returned by the data API
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct DataClient {
    http: Client,
    rest_url: Url,
    anon_key: Secret<String>,
}

impl std::fmt::Debug for DataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataClient")
            .field("rest_url", &self.rest_url.as_str())
            .finish_non_exhaustive()
    }
}

impl DataClient {
    pub fn new(project_url: &str, anon_key: Secret<String>) -> Result<Self, DataError> {
        let mut base = Url::parse(project_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let rest_url = base.join("rest/v1/")?;

        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http,
            rest_url,
            anon_key,
        })
    }

    /// Starts a query against a table
    pub fn table(&self, name: &str) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table: name.to_string(),
            params: Vec::new(),
        }
    }

    /// Checks that the data API answers with the configured key
    #[tracing::instrument(skip(self))]
    pub async fn ping(&self) -> Result<(), DataError> {
        let response = self.request(Method::GET, self.rest_url.clone()).send().await?;
        check_status(response).await.map(|_| ())
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let key = self.anon_key.expose_secret();
        self.http
            .request(method, url)
            .header("apikey", key)
            .bearer_auth(key)
            .header("Accept", "application/json")
    }
}

/// A single-table request being built up
pub struct TableQuery<'a> {
    client: &'a DataClient,
    table: String,
    params: Vec<(String, String)>,
}

impl<'a> TableQuery<'a> {
    pub fn select(mut self, columns: &str) -> Self {
        self.params.push(("select".to_string(), columns.to_string()));
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.params.push((column.to_string(), format!("eq.{}", value)));
        self
    }

    pub fn order_desc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{}.desc", column)));
        self
    }

    /// Descending order with rows lacking a value last
    pub fn order_desc_nulls_last(mut self, column: &str) -> Self {
        self.params
            .push(("order".to_string(), format!("{}.desc.nullslast", column)));
        self
    }

    pub fn order_asc(mut self, column: &str) -> Self {
        self.params.push(("order".to_string(), format!("{}.asc", column)));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.params.push(("limit".to_string(), limit.to_string()));
        self
    }

    fn has_filter(&self) -> bool {
        self.params.iter().any(|(key, value)| {
            !matches!(key.as_str(), "select" | "order" | "limit") && value.contains('.')
        })
    }

    fn url(&self) -> Result<Url, DataError> {
        let mut url = self.client.rest_url.join(&self.table)?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.params);
        }
        Ok(url)
    }

    /// Fetches every matching row
    pub async fn fetch_all<T: DeserializeOwned>(self) -> Result<Vec<T>, DataError> {
        let url = self.url()?;
        tracing::debug!(table = %self.table, "Fetching rows");

        let response = self.client.request(Method::GET, url).send().await?;
        let rows = check_status(response).await?.json::<Vec<T>>().await?;

        Ok(rows)
    }

    /// Fetches the first matching row, if any
    pub async fn fetch_optional<T: DeserializeOwned>(self) -> Result<Option<T>, DataError> {
        let rows = self.limit(1).fetch_all::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Inserts one row and returns it as stored
    pub async fn insert<B, T>(self, body: &B) -> Result<T, DataError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url()?;
        tracing::debug!(table = %self.table, "Inserting row");

        let response = self
            .client
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows = check_status(response).await?.json::<Vec<T>>().await?;

        rows.into_iter()
            .next()
            .ok_or(DataError::NoRowsReturned(self.table))
    }

    /// Updates matching rows and returns the first one, `None` if nothing matched
    pub async fn update<B, T>(self, body: &B) -> Result<Option<T>, DataError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        if !self.has_filter() {
            return Err(DataError::MissingFilter("update"));
        }
        let url = self.url()?;
        tracing::debug!(table = %self.table, "Updating rows");

        let response = self
            .client
            .request(Method::PATCH, url)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows = check_status(response).await?.json::<Vec<T>>().await?;

        Ok(rows.into_iter().next())
    }

    /// Deletes matching rows and returns how many were removed
    pub async fn delete(self) -> Result<usize, DataError> {
        if !self.has_filter() {
            return Err(DataError::MissingFilter("delete"));
        }
        let url = self.url()?;
        tracing::debug!(table = %self.table, "Deleting rows");

        let response = self
            .client
            .request(Method::DELETE, url)
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let rows = check_status(response)
            .await?
            .json::<Vec<serde_json::Value>>()
            .await?;

        Ok(rows.len())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, DataError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ApiErrorBody>(&text) {
        Ok(body) => match body.details {
            Some(details) => format!("{} ({})", body.message, details),
            None => body.message,
        },
        Err(_) if text.is_empty() => status.to_string(),
        Err(_) => text,
    };

    Err(DataError::Api { status, message })
}
