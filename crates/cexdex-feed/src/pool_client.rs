//! HTTP client for the pool price endpoint.
//!
//! Fetches `<base_url><pool_address>` and reads
//! `data.attributes.base_token_price_usd` from the JSON document.

use crate::error::{FeedError, FeedResult};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Default timeout for pool requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the pool price endpoint.
#[derive(Debug, Clone)]
pub struct PoolClient {
    client: Client,
    url: String,
}

impl PoolClient {
    /// Create a client for `base_url` joined with `pool_address`.
    ///
    /// A missing trailing slash on `base_url` is added.
    pub fn new(base_url: &str, pool_address: &str) -> FeedResult<Self> {
        Self::with_timeout(base_url, pool_address, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, pool_address: &str, timeout: Duration) -> FeedResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FeedError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        let url = if base_url.ends_with('/') {
            format!("{base_url}{pool_address}")
        } else {
            format!("{base_url}/{pool_address}")
        };

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the current base token price in USD.
    pub async fn fetch_price(&self) -> FeedResult<f64> {
        debug!(url = %self.url, "Fetching pool price");

        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FeedError::Unavailable(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Pool endpoint returned failure status");
            return Err(FeedError::Unavailable(format!("HTTP {status}: {body}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::Unavailable(format!("Failed to read response: {e}")))?;
        let document: Value = serde_json::from_str(&body)?;

        parse_pool_price(&document)
    }
}

/// Extract the base token price from a pool document.
///
/// The price may be a numeric string or a JSON number; it must be finite
/// and positive.
pub fn parse_pool_price(document: &Value) -> FeedResult<f64> {
    let raw = document
        .pointer("/data/attributes/base_token_price_usd")
        .ok_or_else(|| FeedError::Parse("missing data.attributes.base_token_price_usd".to_string()))?;

    let price = match raw {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| FeedError::Parse(format!("invalid price '{s}': {e}")))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FeedError::Parse(format!("invalid price {n}")))?,
        other => {
            return Err(FeedError::Parse(format!(
                "expected price string, got {other}"
            )))
        }
    };

    if !price.is_finite() || price <= 0.0 {
        return Err(FeedError::Parse(format!("unusable price {price}")));
    }
    Ok(price)
}
