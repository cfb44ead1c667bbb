//! Marketplace API client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::application::errors::LookupError;
use crate::domain::entities::FloorPriceQuote;
use crate::domain::traits::FloorPriceSource;

/// HTTP client for the marketplace's collection stats endpoint.
///
/// One outbound call per lookup with a bounded timeout, no retries. The
/// base URL and timeout come from configuration.
pub struct MarketplaceClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

/// Stats response shape: a numeric floor price plus its currency.
#[derive(Debug, Deserialize)]
struct StatsResponse {
    floor: f64,
    currency: String,
}

impl MarketplaceClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key,
            timeout,
        }
    }

    fn stats_url(&self, slug: &str) -> String {
        format!("{}/collection/{}/stats", self.base_url, slug)
    }
}

#[async_trait]
impl FloorPriceSource for MarketplaceClient {
    async fn fetch_floor_price(&self, slug: &str) -> Result<FloorPriceQuote, LookupError> {
        let mut request = self.client.get(self.stats_url(slug)).timeout(self.timeout);
        if let Some(key) = &self.api_key {
            request = request.header("X-API-KEY", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LookupError::Upstream(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(LookupError::NotFound),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                return Err(LookupError::RateLimited { retry_after });
            }
            status if !status.is_success() => {
                return Err(LookupError::Upstream(format!(
                    "marketplace API error: {}",
                    status
                )));
            }
            _ => {}
        }

        let stats: StatsResponse = response
            .json()
            .await
            .map_err(|e| LookupError::Upstream(e.to_string()))?;

        Ok(FloorPriceQuote::new(slug, stats.floor, stats.currency))
    }
}
