//! Wire models for the CoinGecko public API.
//!
//! Only the fields the pipeline consumes are modelled; anything else in the
//! payload is ignored by serde.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ============================================================================
// Spot Price
// ============================================================================

/// Response from `/simple/price?ids=bitcoin&vs_currencies=usd`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SimplePriceResponse {
    pub bitcoin: AssetQuote,
}

/// Quote for one asset, keyed by target currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AssetQuote {
    pub usd: f64,
}

impl SimplePriceResponse {
    pub fn usd(price: f64) -> Self {
        Self {
            bitcoin: AssetQuote { usd: price },
        }
    }
}

// ============================================================================
// Market Chart
// ============================================================================

/// Response from `/coins/bitcoin/market_chart?vs_currency=usd&days=N`
///
/// `prices` holds `[timestamp_ms, price]` pairs in ascending time order.
/// The endpoint also returns `market_caps` and `total_volumes`, which are
/// not used.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct MarketChartResponse {
    pub prices: Vec<[f64; 2]>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_price_parses_coingecko_body() {
        let body = r#"{"bitcoin":{"usd":84123.5}}"#;
        let parsed: SimplePriceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed, SimplePriceResponse::usd(84123.5));
    }

    #[test]
    fn test_market_chart_ignores_extra_series() {
        let body = r#"{
            "prices": [[1735689600000, 93500.1], [1735776000000, 94420]],
            "market_caps": [[1735689600000, 1.8e12]],
            "total_volumes": [[1735689600000, 2.1e10]]
        }"#;
        let parsed: MarketChartResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.prices.len(), 2);
        assert_eq!(parsed.prices[1], [1735776000000.0, 94420.0]);
    }

    #[test]
    fn test_simple_price_rejects_missing_asset() {
        let body = r#"{"ethereum":{"usd":3000}}"#;
        assert!(serde_json::from_str::<SimplePriceResponse>(body).is_err());
    }
}
