//! Price data pipeline with live-first, fallback-always semantics.
//!
//! Every public operation returns a plain value: when the live source fails
//! the failure is logged and counted, and locally generated data is handed
//! out instead. Callers (the dashboard, the ticker, the REST handlers) never
//! see a network error.

use crate::domain::{
    Clock, DataOrigin, MarketChartResponse, PricePoint, PriceSeries, PriceSource, RandomSource,
    SimplePriceResponse, Sourced,
};
use crate::infrastructure::{SystemClock, ThreadRandom};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Price substituted when the spot price cannot be fetched, and the base of
/// every synthetic series.
pub const FALLBACK_BITCOIN_PRICE: f64 = 79_800.0;

/// Trailing window of the historical series when the caller does not pick one.
pub const DEFAULT_HISTORY_DAYS: NonZeroU32 = match NonZeroU32::new(7) {
    Some(days) => days,
    None => panic!("default history window must be non-zero"),
};

/// Horizon of the predicted series when the caller does not pick one.
pub const DEFAULT_PREDICTION_DAYS: NonZeroU32 = match NonZeroU32::new(7) {
    Some(days) => days,
    None => panic!("default prediction horizon must be non-zero"),
};

/// Synthetic prices are drawn from `base * [0.95, 1.05]`.
const SYNTHETIC_SPREAD: (f64, f64) = (0.95, 1.05);

/// Extra markup applied to a synthetic series standing in for predictions.
const PREDICTION_FALLBACK_MARKUP: f64 = 0.05;

/// Bitcoin price data service
///
/// Holds the live source plus the clock and randomness capabilities; it
/// keeps no state between calls.
#[derive(Clone)]
pub struct PriceDataService {
    source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    rng: Arc<dyn RandomSource>,
}

impl PriceDataService {
    /// Create a new service instance
    pub fn new(
        source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        rng: Arc<dyn RandomSource>,
    ) -> Self {
        Self { source, clock, rng }
    }

    /// Create a service on the wall clock and the thread-local generator
    pub fn with_defaults(source: Arc<dyn PriceSource>) -> Self {
        Self::new(source, Arc::new(SystemClock), Arc::new(ThreadRandom))
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn rng(&self) -> &Arc<dyn RandomSource> {
        &self.rng
    }

    // ========================================================================
    // Spot Price
    // ========================================================================

    /// Current Bitcoin price in USD; [`FALLBACK_BITCOIN_PRICE`] when the
    /// live source fails.
    pub async fn current_price(&self) -> f64 {
        self.fetch_current_price().await.into_inner()
    }

    /// Current price tagged with its origin
    pub async fn fetch_current_price(&self) -> Sourced<f64> {
        let fetched = self.source.spot_price().await.and_then(normalize_spot_price);

        match fetched {
            Ok(price) => {
                record_fetch("current_price", DataOrigin::Live);
                Sourced::Live(price)
            }
            Err(e) => {
                warn!(
                    "Error fetching Bitcoin price, using fallback {}: {:#}",
                    FALLBACK_BITCOIN_PRICE, e
                );
                record_fetch("current_price", DataOrigin::Fallback);
                Sourced::Fallback(FALLBACK_BITCOIN_PRICE)
            }
        }
    }

    // ========================================================================
    // Historical Series
    // ========================================================================

    /// Trailing `days` of prices, oldest first; a synthetic series when the
    /// live source fails. Never empty.
    pub async fn historical_series(&self, days: NonZeroU32) -> PriceSeries {
        self.fetch_historical_series(days).await.into_inner()
    }

    /// Historical series tagged with its origin
    pub async fn fetch_historical_series(&self, days: NonZeroU32) -> Sourced<PriceSeries> {
        let fetched = self
            .source
            .market_chart(days.get())
            .await
            .and_then(normalize_market_chart);

        match fetched {
            Ok(series) => {
                info!("Fetched {} historical points for {} days", series.len(), days);
                record_fetch("historical_series", DataOrigin::Live);
                Sourced::Live(series)
            }
            Err(e) => {
                warn!(
                    "Error fetching historical price data for {} days, using synthetic series: {:#}",
                    days, e
                );
                record_fetch("historical_series", DataOrigin::Fallback);
                Sourced::Fallback(self.synthetic_series(days.get()))
            }
        }
    }

    /// Generate `days + 1` daily points ending now, each priced at
    /// [`FALLBACK_BITCOIN_PRICE`] times an independent factor drawn
    /// uniformly from `[0.95, 1.05]`.
    ///
    /// Days that fall outside the representable date range are skipped.
    pub fn synthetic_series(&self, days: u32) -> PriceSeries {
        let now = self.clock.now();
        let (low, high) = SYNTHETIC_SPREAD;

        (0..=days)
            .rev()
            .filter_map(|i| {
                let date = now.checked_sub_signed(Duration::days(i64::from(i)))?;
                let factor = self.rng.uniform(low, high);
                Some(PricePoint::new(date, FALLBACK_BITCOIN_PRICE * factor))
            })
            .collect()
    }

    // ========================================================================
    // Predicted Series
    // ========================================================================

    /// `days` projected daily points starting today.
    ///
    /// One drift factor in `[0.99, 1.03]` is drawn per call and compounded,
    /// so point `i` is `current * factor^i`. If the projection cannot be
    /// built, a synthetic series marked up by up to 5% is returned instead.
    pub async fn predicted_series(&self, days: NonZeroU32) -> PriceSeries {
        self.fetch_predicted_series(days).await.into_inner()
    }

    /// Predicted series tagged with its origin
    ///
    /// The series is `Live` only when both the spot price and the
    /// projection succeeded.
    pub async fn fetch_predicted_series(&self, days: NonZeroU32) -> Sourced<PriceSeries> {
        let current = self.fetch_current_price().await;
        let factor = 1.0 + (self.rng.unit() * 0.04 - 0.01);
        debug!("Projecting {} days from {} with drift factor {}", days, current.value(), factor);

        match project_series(*current.value(), factor, days.get(), self.clock.now()) {
            Ok(series) => {
                record_fetch("predicted_series", current.origin());
                current.map(|_| series)
            }
            Err(e) => {
                warn!("Error generating predicted prices, using synthetic series: {:#}", e);
                record_fetch("predicted_series", DataOrigin::Fallback);
                Sourced::Fallback(self.marked_up_synthetic_series(days.get()))
            }
        }
    }

    fn marked_up_synthetic_series(&self, days: u32) -> PriceSeries {
        self.synthetic_series(days)
            .into_iter()
            .map(|point| {
                let markup = 1.0 + self.rng.unit() * PREDICTION_FALLBACK_MARKUP;
                PricePoint::new(point.date, point.price * markup)
            })
            .collect()
    }
}

/// Compound `factor` over `days` daily steps starting at `now`.
fn project_series(
    current: f64,
    factor: f64,
    days: u32,
    now: DateTime<Utc>,
) -> Result<PriceSeries> {
    (0..days)
        .map(|i| {
            let date = now
                .checked_add_signed(Duration::days(i64::from(i)))
                .with_context(|| format!("Prediction date {} days after {} is out of range", i, now))?;
            let price = current * factor.powf(f64::from(i));
            anyhow::ensure!(
                price.is_finite() && price >= 0.0,
                "Projected price {} on day {} is not a valid price",
                price,
                i
            );
            Ok(PricePoint::new(date, price))
        })
        .collect()
}

/// Validate the spot quote.
fn normalize_spot_price(response: SimplePriceResponse) -> Result<f64> {
    let price = response.bitcoin.usd;
    anyhow::ensure!(
        price.is_finite() && price >= 0.0,
        "Malformed spot price: {}",
        price
    );
    Ok(price)
}

/// Map `[timestamp_ms, price]` pairs onto price points, keeping source order.
///
/// Points that do not advance past the previous timestamp are dropped so the
/// series stays strictly increasing.
fn normalize_market_chart(response: MarketChartResponse) -> Result<PriceSeries> {
    anyhow::ensure!(!response.prices.is_empty(), "Market chart contained no prices");

    let mut series: PriceSeries = Vec::with_capacity(response.prices.len());
    for [timestamp_ms, price] in response.prices {
        anyhow::ensure!(
            timestamp_ms.is_finite(),
            "Malformed market chart timestamp: {}",
            timestamp_ms
        );
        anyhow::ensure!(
            price.is_finite() && price >= 0.0,
            "Malformed market chart price: {}",
            price
        );
        let date = DateTime::<Utc>::from_timestamp_millis(timestamp_ms as i64)
            .with_context(|| format!("Market chart timestamp {} is out of range", timestamp_ms))?;

        if let Some(last) = series.last() {
            if date <= last.date {
                debug!("Dropping out-of-order market chart point at {}", date);
                continue;
            }
        }
        series.push(PricePoint::new(date, price));
    }

    Ok(series)
}

fn record_fetch(operation: &'static str, origin: DataOrigin) {
    let origin = match origin {
        DataOrigin::Live => "live",
        DataOrigin::Fallback => "fallback",
    };
    metrics::counter!("price_fetch_total", "operation" => operation, "origin" => origin)
        .increment(1);
}
