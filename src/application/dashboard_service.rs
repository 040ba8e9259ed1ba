//! One-shot dashboard load.
//!
//! Composes the price pipeline and the insight feeds into the payload the
//! dashboard renders on first paint. Like the pipeline it never fails: every
//! part degrades to its fallback on its own.

use crate::application::analytics::{
    compare_recent, timeframe_outlook, upcoming_predictions, ComparisonRow, PredictionDelta,
    TimeframeOutlook,
};
use crate::application::insights::{
    ConfidenceReport, InsightsService, NewsItem, SentimentReport, TrendAlert,
};
use crate::application::price_service::DEFAULT_PREDICTION_DAYS;
use crate::application::PriceDataService;
use crate::domain::{DataOrigin, PriceSeries, Timeframe};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

/// Days of history loaded for the dashboard chart.
pub const DASHBOARD_HISTORY_DAYS: NonZeroU32 = match NonZeroU32::new(30) {
    Some(days) => days,
    None => panic!("dashboard history window must be non-zero"),
};

/// Everything the dashboard shows on load.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub current_price: f64,
    pub price_origin: DataOrigin,
    pub historical: PriceSeries,
    pub historical_origin: DataOrigin,
    pub predicted: PriceSeries,
    pub predicted_origin: DataOrigin,
    pub upcoming: Vec<PredictionDelta>,
    pub comparison: Vec<ComparisonRow>,
    pub outlooks: Vec<TimeframeOutlook>,
    pub news: Vec<NewsItem>,
    pub sentiment: SentimentReport,
    pub confidence: ConfidenceReport,
    pub trend_alerts: Vec<TrendAlert>,
}

/// Dashboard composition service
#[derive(Clone)]
pub struct DashboardService {
    prices: Arc<PriceDataService>,
    insights: Arc<InsightsService>,
}

impl DashboardService {
    pub fn new(prices: Arc<PriceDataService>, insights: Arc<InsightsService>) -> Self {
        Self { prices, insights }
    }

    /// Load the dashboard: price, 30 days of history, 7 days of
    /// predictions, then the derived views and insight feeds.
    pub async fn load(&self) -> DashboardResponse {
        let current = self.prices.fetch_current_price().await;
        let historical = self.prices.fetch_historical_series(DASHBOARD_HISTORY_DAYS).await;
        let predicted = self.prices.fetch_predicted_series(DEFAULT_PREDICTION_DAYS).await;

        let now = self.prices.clock().now();
        let comparison = compare_recent(historical.value(), predicted.value(), now);
        let upcoming = upcoming_predictions(predicted.value());
        let outlooks = Timeframe::ALL
            .into_iter()
            .map(|tf| timeframe_outlook(*current.value(), tf, now, self.prices.rng().as_ref()))
            .collect();

        info!(
            "Dashboard loaded (price: {:?}, history: {:?}, predictions: {:?})",
            current.origin(),
            historical.origin(),
            predicted.origin()
        );

        DashboardResponse {
            current_price: *current.value(),
            price_origin: current.origin(),
            historical_origin: historical.origin(),
            historical: historical.into_inner(),
            predicted_origin: predicted.origin(),
            predicted: predicted.into_inner(),
            upcoming,
            comparison,
            outlooks,
            news: self.insights.news(),
            sentiment: self.insights.sentiment(),
            confidence: self.insights.prediction_confidence(),
            trend_alerts: self.insights.trend_alerts(),
        }
    }
}
