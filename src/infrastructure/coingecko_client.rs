//! HTTP client for the CoinGecko public API.
//!
//! Covers the two endpoints the price pipeline needs: the spot price quote
//! and the trailing market chart. Every request is a single attempt; the
//! service decides what to substitute when a request fails.

use crate::domain::{MarketChartResponse, PriceSource, SimplePriceResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

/// Base URL for the CoinGecko v3 API
pub const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Request timeout in seconds
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Asset id queried on every endpoint
const ASSET_ID: &str = "bitcoin";

/// Quote currency
const VS_CURRENCY: &str = "usd";

const USER_AGENT: &str = "BtcPriceGateway/0.1";

/// CoinGecko API client
#[derive(Clone, Debug)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Create a new client against the public CoinGecko API
    pub fn new() -> Result<Self> {
        Self::with_base_url(BASE_URL)
    }

    /// Create a new client with a custom base URL (for testing)
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        Self::with_options(
            base_url,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
            USER_AGENT,
        )
    }

    /// Create a client with an explicit timeout and user agent
    pub fn with_options(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path of the spot price endpoint
    ///
    /// GET /simple/price?ids=bitcoin&vs_currencies=usd
    pub fn spot_price_path() -> String {
        format!("/simple/price?ids={}&vs_currencies={}", ASSET_ID, VS_CURRENCY)
    }

    /// Path of the market chart endpoint
    ///
    /// GET /coins/bitcoin/market_chart?vs_currency=usd&days=N
    pub fn market_chart_path(days: u32) -> String {
        format!(
            "/coins/{}/market_chart?vs_currency={}&days={}",
            ASSET_ID, VS_CURRENCY, days
        )
    }

    /// Internal method to make a single GET request and decode the JSON body
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching from CoinGecko API: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to fetch from {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "API request failed with status {}: {}",
                status,
                error_body
            );
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse JSON from {}", url))?;

        Ok(body)
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn spot_price(&self) -> Result<SimplePriceResponse> {
        let path = Self::spot_price_path();
        info!("Fetching spot price: {}", path);
        self.get(&path).await
    }

    async fn market_chart(&self, days: u32) -> Result<MarketChartResponse> {
        let path = Self::market_chart_path(days);
        info!("Fetching market chart: {}", path);
        self.get(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_client_creation() {
        let client = CoinGeckoClient::new().unwrap();
        assert_eq!(client.base_url(), BASE_URL);

        let custom_client = CoinGeckoClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(custom_client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(
            CoinGeckoClient::spot_price_path(),
            "/simple/price?ids=bitcoin&vs_currencies=usd"
        );
        assert_eq!(
            CoinGeckoClient::market_chart_path(30),
            "/coins/bitcoin/market_chart?vs_currency=usd&days=30"
        );
    }

    #[tokio::test]
    async fn test_spot_price_decodes_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .and(query_param("ids", "bitcoin"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"bitcoin": {"usd": 81234.0}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = CoinGeckoClient::with_base_url(&server.uri()).unwrap();
        let quote = client.spot_price().await.unwrap();
        assert_eq!(quote.bitcoin.usd, 81234.0);
    }

    #[tokio::test]
    async fn test_market_chart_decodes_pairs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/coins/bitcoin/market_chart"))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("days", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "prices": [[1735689600000u64, 93500.0], [1735776000000u64, 94000.0]],
                "market_caps": [],
                "total_volumes": []
            })))
            .mount(&server)
            .await;

        let client = CoinGeckoClient::with_base_url(&server.uri()).unwrap();
        let chart = client.market_chart(2).await.unwrap();
        assert_eq!(chart.prices.len(), 2);
        assert_eq!(chart.prices[0][1], 93500.0);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = CoinGeckoClient::with_base_url(&server.uri()).unwrap();
        let err = client.spot_price().await.unwrap_err();
        assert!(err.to_string().contains("429"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/simple/price"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"bitcoin": {}})),
            )
            .mount(&server)
            .await;

        let client = CoinGeckoClient::with_base_url(&server.uri()).unwrap();
        let err = client.spot_price().await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse JSON"));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_an_error() {
        // Port 9 (discard) is not expected to serve HTTP
        let client = CoinGeckoClient::with_options(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            USER_AGENT,
        )
        .unwrap();
        assert!(client.market_chart(7).await.is_err());
    }
}
