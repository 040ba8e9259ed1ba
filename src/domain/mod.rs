//! Domain layer - Core price entities and capability traits.
//!
//! This module defines the domain model for the Bitcoin price gateway.
//! It contains:
//! - The price point / series entities every other layer exchanges
//! - Capability traits for the live price source, the clock and the
//!   randomness source, so the pipeline can be driven deterministically
//! - The tagged `Sourced` result that records whether data is live or synthetic
//! - CoinGecko wire models for the spot price and market chart endpoints

pub mod market_models;
pub use market_models::*;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use utoipa::ToSchema;

/// A single observed or derived price.
///
/// `date` is serialized as an ISO-8601 / RFC 3339 instant, `price` is in USD
/// and never negative.
///
/// # Examples
///
/// ```
/// use btc_price_gateway::domain::PricePoint;
/// use chrono::{TimeZone, Utc};
///
/// let point = PricePoint::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(), 79800.0);
/// assert_eq!(point.price, 79800.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PricePoint {
    /// Instant of the observation (ISO 8601)
    pub date: DateTime<Utc>,
    /// Price in USD
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: DateTime<Utc>, price: f64) -> Self {
        Self { date, price }
    }
}

/// Ordered sequence of price points, oldest first.
///
/// Series are built fresh on every call and handed to the caller; nothing
/// in the pipeline keeps them around.
pub type PriceSeries = Vec<PricePoint>;

/// Where a value handed out by the pipeline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DataOrigin {
    /// Fetched from the live price API
    Live,
    /// Substituted locally because the live source failed
    Fallback,
}

/// Result of a fetch that always produces a value.
///
/// The pipeline tags every value with its origin internally and unwraps it
/// at the service boundary, so callers get plain values while logging and
/// metrics can still tell live data from substituted data.
#[derive(Debug, Clone, PartialEq)]
pub enum Sourced<T> {
    Live(T),
    Fallback(T),
}

impl<T> Sourced<T> {
    pub fn origin(&self) -> DataOrigin {
        match self {
            Sourced::Live(_) => DataOrigin::Live,
            Sourced::Fallback(_) => DataOrigin::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Sourced::Fallback(_))
    }

    pub fn value(&self) -> &T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Sourced::Live(v) | Sourced::Fallback(v) => v,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sourced<U> {
        match self {
            Sourced::Live(v) => Sourced::Live(f(v)),
            Sourced::Fallback(v) => Sourced::Fallback(f(v)),
        }
    }
}

/// Chart window selectable by dashboard consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Timeframe {
    /// Trailing 24 hours
    #[serde(rename = "24h")]
    Day,
    /// Trailing 7 days
    #[serde(rename = "7d")]
    #[default]
    Week,
    /// Trailing 30 days
    #[serde(rename = "30d")]
    Month,
    /// Trailing 365 days
    #[serde(rename = "1y")]
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
    ];

    /// Length of the trailing window this timeframe selects.
    pub fn span(self) -> Duration {
        match self {
            Timeframe::Day => Duration::hours(24),
            Timeframe::Week => Duration::days(7),
            Timeframe::Month => Duration::days(30),
            Timeframe::Year => Duration::days(365),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::Year => "1y",
        }
    }
}

impl From<&str> for Timeframe {
    /// Parse a timeframe label.
    ///
    /// Unrecognized labels select the 7 day window.
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_price_gateway::domain::Timeframe;
    ///
    /// assert_eq!(Timeframe::from("24h"), Timeframe::Day);
    /// assert_eq!(Timeframe::from("1y"), Timeframe::Year);
    /// assert_eq!(Timeframe::from("fortnight"), Timeframe::Week);
    /// ```
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "24h" | "1d" => Timeframe::Day,
            "7d" => Timeframe::Week,
            "30d" => Timeframe::Month,
            "1y" | "365d" => Timeframe::Year,
            _ => Timeframe::Week,
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live source of Bitcoin market data.
///
/// Implementations must be thread-safe (`Send + Sync`) for use in async
/// contexts. Errors are returned as-is; deciding what to substitute on
/// failure is the service's job, not the source's.
///
/// # Implementations
///
/// See `infrastructure::coingecko_client::CoinGeckoClient` for the CoinGecko implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the current spot price quote.
    ///
    /// # Errors
    ///
    /// - Returns error if network communication fails
    /// - Returns error if the endpoint answers with a non-success status
    /// - Returns error if the body is not the expected JSON shape
    async fn spot_price(&self) -> anyhow::Result<SimplePriceResponse>;

    /// Fetch the trailing `days` of `[timestamp_ms, price]` pairs.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`PriceSource::spot_price`].
    async fn market_chart(&self, days: u32) -> anyhow::Result<MarketChartResponse>;
}

/// Source of "now" for every date the pipeline computes.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of uniform random numbers.
pub trait RandomSource: Send + Sync + Debug {
    /// Draw a number uniformly from `[0, 1)`.
    fn unit(&self) -> f64;

    /// Draw a number uniformly from `[low, high)`.
    fn uniform(&self, low: f64, high: f64) -> f64 {
        low + self.unit() * (high - low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeframe_parsing_defaults_to_week() {
        assert_eq!(Timeframe::from("30d"), Timeframe::Month);
        assert_eq!(Timeframe::from(" 7D "), Timeframe::Week);
        assert_eq!(Timeframe::from(""), Timeframe::Week);
        assert_eq!(Timeframe::from("all"), Timeframe::Week);
        assert_eq!(Timeframe::default(), Timeframe::Week);
    }

    #[test]
    fn test_timeframe_spans() {
        assert_eq!(Timeframe::Day.span(), Duration::hours(24));
        assert_eq!(Timeframe::Week.span(), Duration::days(7));
        assert_eq!(Timeframe::Month.span(), Duration::days(30));
        assert_eq!(Timeframe::Year.span(), Duration::days(365));
    }

    #[test]
    fn test_timeframe_labels_round_trip_through_from() {
        for tf in Timeframe::ALL {
            assert_eq!(Timeframe::from(tf.as_str()), tf);
        }
    }

    #[test]
    fn test_sourced_keeps_origin_through_map() {
        let live = Sourced::Live(2.0).map(|v| v * 2.0);
        assert_eq!(live, Sourced::Live(4.0));
        assert_eq!(live.origin(), DataOrigin::Live);

        let fallback = Sourced::Fallback(1).map(|v| v + 1);
        assert!(fallback.is_fallback());
        assert_eq!(*fallback.value(), 2);
        assert_eq!(fallback.into_inner(), 2);
    }
}
