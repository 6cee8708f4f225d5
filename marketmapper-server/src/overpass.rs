//! Overpass API client

use std::time::Duration;

use async_trait::async_trait;
use marketmapper_core::{OverpassQuery, OverpassResponse};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

const USER_AGENT: &str = concat!("MarketMapper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum MapDataError {
    #[error("Overpass request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Overpass returned HTTP {0}")]
    Status(u16),

    #[error("Overpass query failed on the server: {0}")]
    Runtime(String),
}

/// Trait for a source of map features
#[async_trait]
pub trait MapDataSource: Send + Sync {
    /// Run one query and return its elements
    async fn run_query(&self, query: &OverpassQuery) -> Result<OverpassResponse, MapDataError>;
}

/// HTTP client for an Overpass interpreter endpoint
pub struct OverpassClient {
    client: reqwest::Client,
    endpoint: String,
}

impl OverpassClient {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, MapDataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(45))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl MapDataSource for OverpassClient {
    async fn run_query(&self, query: &OverpassQuery) -> Result<OverpassResponse, MapDataError> {
        tracing::debug!(endpoint = %self.endpoint, query = %query.as_str(), "Running Overpass query");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MapDataError::Status(status.as_u16()));
        }

        let body: OverpassResponse = response.json().await?;
        if let Some(remark) = body.runtime_error() {
            return Err(MapDataError::Runtime(remark.to_string()));
        }

        tracing::debug!(
            elements = body.element_count(),
            sample = ?body.names().take(3).collect::<Vec<_>>(),
            "Overpass query complete"
        );
        Ok(body)
    }
}
