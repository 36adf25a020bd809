//! US state boundary data.
//!
//! The choropleth layer needs GeoJSON boundaries. They are fetched from
//! the upstream source on first request and cached in memory; a failed
//! fetch is reported to the caller and retried next time, and the rest of
//! the application keeps working without a rendered map layer.

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::{Error, Result};

pub struct Boundaries {
    url: String,
    client: reqwest::Client,
    cache: RwLock<Option<Value>>,
}

impl Boundaries {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            cache: RwLock::new(None),
        }
    }

    /// The boundary GeoJSON, fetched on first use.
    pub async fn get(&self) -> Result<Value> {
        if let Some(cached) = self.cache.read().await.clone() {
            return Ok(cached);
        }

        let value = self.fetch().await?;
        *self.cache.write().await = Some(value.clone());
        Ok(value)
    }

    async fn fetch(&self) -> Result<Value> {
        info!(url = %self.url, "Fetching state boundary data");
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Boundary data fetch failed");
                Error::BoundaryFetch(e.to_string())
            })?;

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::BoundaryFetch(e.to_string()))
    }
}
