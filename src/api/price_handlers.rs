//! HTTP handlers for the price pipeline, derived views and insight feeds.
//!
//! Pipeline-backed handlers always answer 200: upstream failures have
//! already been replaced by fallback data, and the `origin` field says so.
//! Only invalid input produces an error status.

use crate::api::state::AppState;
use crate::application::analytics::{
    compare_recent, filter_by_timeframe, merge_chart_series, timeframe_outlook,
    upcoming_predictions, ChartPoint, ComparisonRow, PredictionDelta, TimeframeOutlook,
};
use crate::application::dashboard_service::{DashboardResponse, DASHBOARD_HISTORY_DAYS};
use crate::application::insights::{ConfidenceReport, NewsItem, SentimentReport, TrendAlert};
use crate::application::price_service::{DEFAULT_HISTORY_DAYS, DEFAULT_PREDICTION_DAYS};
use crate::application::price_ticker::{AlertStatus, PriceSnapshot};
use crate::domain::{DataOrigin, PricePoint, Timeframe};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

// ============================================================================
// Query Parameters
// ============================================================================

/// Query parameters for the historical series endpoint
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
pub struct HistoryQuery {
    /// Trailing window in days (1-365, default 7)
    #[validate(range(min = 1, max = 365))] // 1 day to 1 year
    pub days: Option<u32>,
    /// Optional chart window applied to the series ("24h", "7d", "30d", "1y")
    #[validate(length(max = 10))]
    pub timeframe: Option<String>,
}

/// Query parameters for the predicted series endpoint
#[derive(Debug, Clone, Deserialize, IntoParams, Validate)]
pub struct PredictionQuery {
    /// Horizon in days including today (1-365, default 7)
    #[validate(range(min = 1, max = 365))]
    pub days: Option<u32>,
}

/// Query parameters for the chart endpoint
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct ChartQuery {
    /// Chart window ("24h", "7d", "30d", "1y"); anything else selects "7d"
    pub timeframe: Option<String>,
}

/// Request body for setting price alert thresholds
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AlertRulesRequest {
    /// Alert when the price rises above this value (USD)
    pub above: Option<f64>,
    /// Alert when the price falls below this value (USD)
    pub below: Option<f64>,
}

// ============================================================================
// Response Types
// ============================================================================

/// A price series with where it came from
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PriceSeriesResponse {
    pub origin: DataOrigin,
    pub days: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<Timeframe>,
    pub count: usize,
    pub points: Vec<PricePoint>,
}

/// Combined historical + predicted chart data
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChartResponse {
    pub timeframe: Timeframe,
    pub points: Vec<ChartPoint>,
}

/// Error response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, error: &str, details: Option<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
}

fn bad_request(error: &str, details: Option<String>) -> ApiError {
    error_response(StatusCode::BAD_REQUEST, error, details)
}

/// Unwrap a query string, reporting parse failures as an [`ErrorResponse`]
fn parsed_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    query
        .map(|Query(q)| q)
        .map_err(|e| error_response(e.status(), "Invalid query parameters", Some(e.body_text())))
}

/// Unwrap a JSON body, keeping axum's status but answering with an [`ErrorResponse`]
fn parsed_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(b)| b)
        .map_err(|e| error_response(e.status(), "Invalid request body", Some(e.body_text())))
}

fn validated<T: Validate>(query: &T) -> Result<(), ApiError> {
    query
        .validate()
        .map_err(|e| bad_request("Validation failed", Some(e.to_string())))
}

fn days_or(days: Option<u32>, default: NonZeroU32) -> NonZeroU32 {
    days.and_then(NonZeroU32::new).unwrap_or(default)
}

// ============================================================================
// Price Handlers
// ============================================================================

/// Latest spot price
#[utoipa::path(
    get,
    path = "/v1/price",
    responses(
        (status = 200, description = "Latest spot price snapshot", body = PriceSnapshot,
            example = json!({
                "price": 84250.0,
                "previousPrice": 84100.0,
                "changePercent": 0.178,
                "origin": "live",
                "updatedAt": "2025-01-10T12:00:00Z"
            })
        )
    ),
    description = "Returns the most recent spot price published by the ticker, fetching one if none has been published yet. Falls back to 79800 USD when the upstream is unavailable.",
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn current_price_handler(State(state): State<AppState>) -> Json<PriceSnapshot> {
    metrics::counter!("api_requests_total", "endpoint" => "price").increment(1);
    Json(state.ticker.latest().await)
}

/// Historical price series
#[utoipa::path(
    get,
    path = "/v1/price/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Historical series, oldest first", body = PriceSeriesResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse)
    ),
    description = "Returns the trailing price series. When the upstream is unavailable a synthetic series of days + 1 daily points is returned with origin \"fallback\".",
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn history_handler(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<PriceSeriesResponse>, ApiError> {
    let query = parsed_query(query)?;
    validated(&query)?;
    metrics::counter!("api_requests_total", "endpoint" => "history").increment(1);

    let days = days_or(query.days, DEFAULT_HISTORY_DAYS);
    let series = state.price_service.fetch_historical_series(days).await;
    let origin = series.origin();
    let timeframe = query.timeframe.as_deref().map(Timeframe::from);

    let points = match timeframe {
        Some(tf) => filter_by_timeframe(series.value(), tf, state.price_service.clock().now()),
        None => series.into_inner(),
    };

    Ok(Json(PriceSeriesResponse {
        origin,
        days: days.get(),
        timeframe,
        count: points.len(),
        points,
    }))
}

/// Predicted price series
#[utoipa::path(
    get,
    path = "/v1/price/predictions",
    params(PredictionQuery),
    responses(
        (status = 200, description = "Predicted series starting today", body = PriceSeriesResponse),
        (status = 400, description = "Invalid input parameters", body = ErrorResponse)
    ),
    description = "Projects the current price forward with a single compounding drift factor in [0.99, 1.03]. Illustrative only; no forecasting model is involved.",
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn predictions_handler(
    State(state): State<AppState>,
    query: Result<Query<PredictionQuery>, QueryRejection>,
) -> Result<Json<PriceSeriesResponse>, ApiError> {
    let query = parsed_query(query)?;
    validated(&query)?;
    metrics::counter!("api_requests_total", "endpoint" => "predictions").increment(1);

    let days = days_or(query.days, DEFAULT_PREDICTION_DAYS);
    let series = state.price_service.fetch_predicted_series(days).await;
    let origin = series.origin();
    let points = series.into_inner();

    Ok(Json(PriceSeriesResponse {
        origin,
        days: days.get(),
        timeframe: None,
        count: points.len(),
        points,
    }))
}

/// Upcoming predictions with change against today
#[utoipa::path(
    get,
    path = "/v1/price/predictions/upcoming",
    responses(
        (status = 200, description = "Predictions after today", body = Vec<PredictionDelta>)
    ),
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn upcoming_handler(State(state): State<AppState>) -> Json<Vec<PredictionDelta>> {
    let predicted = state
        .price_service
        .predicted_series(DEFAULT_PREDICTION_DAYS)
        .await;
    Json(upcoming_predictions(&predicted))
}

/// Actual vs predicted over the last five days
#[utoipa::path(
    get,
    path = "/v1/price/comparison",
    responses(
        (status = 200, description = "Per-day comparison rows", body = Vec<ComparisonRow>)
    ),
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn comparison_handler(State(state): State<AppState>) -> Json<Vec<ComparisonRow>> {
    let historical = state
        .price_service
        .historical_series(DASHBOARD_HISTORY_DAYS)
        .await;
    let predicted = state
        .price_service
        .predicted_series(DEFAULT_PREDICTION_DAYS)
        .await;
    let now = state.price_service.clock().now();
    Json(compare_recent(&historical, &predicted, now))
}

/// Combined chart series for a timeframe
#[utoipa::path(
    get,
    path = "/v1/price/chart",
    params(ChartQuery),
    responses(
        (status = 200, description = "Merged historical and predicted points", body = ChartResponse),
        (status = 400, description = "Malformed query string", body = ErrorResponse)
    ),
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn chart_handler(
    State(state): State<AppState>,
    query: Result<Query<ChartQuery>, QueryRejection>,
) -> Result<Json<ChartResponse>, ApiError> {
    let query = parsed_query(query)?;
    let timeframe = query
        .timeframe
        .as_deref()
        .map(Timeframe::from)
        .unwrap_or_default();

    let historical = state
        .price_service
        .historical_series(DASHBOARD_HISTORY_DAYS)
        .await;
    let predicted = state
        .price_service
        .predicted_series(DEFAULT_PREDICTION_DAYS)
        .await;
    let now = state.price_service.clock().now();
    let visible = filter_by_timeframe(&historical, timeframe, now);

    Ok(Json(ChartResponse {
        timeframe,
        points: merge_chart_series(&visible, &predicted),
    }))
}

/// Forward outlook for one timeframe
#[utoipa::path(
    get,
    path = "/v1/price/outlook/{timeframe}",
    params(
        ("timeframe" = String, Path, description = "Outlook horizon: 24h, 7d, 30d or 1y", example = "30d")
    ),
    responses(
        (status = 200, description = "Outlook points for the horizon", body = TimeframeOutlook)
    ),
    tag = "price"
)]
#[instrument(skip(state))]
pub async fn outlook_handler(
    Path(timeframe): Path<String>,
    State(state): State<AppState>,
) -> Json<TimeframeOutlook> {
    let current = state.ticker.latest().await.price;
    let now = state.price_service.clock().now();
    Json(timeframe_outlook(
        current,
        Timeframe::from(timeframe.as_str()),
        now,
        state.price_service.rng().as_ref(),
    ))
}

/// Full dashboard payload
#[utoipa::path(
    get,
    path = "/v1/dashboard",
    responses(
        (status = 200, description = "Everything the dashboard renders on load", body = DashboardResponse)
    ),
    tag = "dashboard"
)]
#[instrument(skip(state))]
pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardResponse> {
    metrics::counter!("api_requests_total", "endpoint" => "dashboard").increment(1);
    Json(state.dashboard.load().await)
}

// ============================================================================
// Insight Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/insights/news",
    responses((status = 200, description = "Latest headlines", body = Vec<NewsItem>)),
    tag = "insights"
)]
pub async fn news_handler(State(state): State<AppState>) -> Json<Vec<NewsItem>> {
    Json(state.insights.news())
}

#[utoipa::path(
    get,
    path = "/v1/insights/sentiment",
    responses((status = 200, description = "Market sentiment", body = SentimentReport)),
    tag = "insights"
)]
pub async fn sentiment_handler(State(state): State<AppState>) -> Json<SentimentReport> {
    Json(state.insights.sentiment())
}

#[utoipa::path(
    get,
    path = "/v1/insights/confidence",
    responses((status = 200, description = "Prediction confidence", body = ConfidenceReport)),
    tag = "insights"
)]
pub async fn confidence_handler(State(state): State<AppState>) -> Json<ConfidenceReport> {
    Json(state.insights.prediction_confidence())
}

#[utoipa::path(
    get,
    path = "/v1/insights/trends",
    responses((status = 200, description = "Trend alerts", body = Vec<TrendAlert>)),
    tag = "insights"
)]
pub async fn trends_handler(State(state): State<AppState>) -> Json<Vec<TrendAlert>> {
    Json(state.insights.trend_alerts())
}

// ============================================================================
// Alert Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/v1/alerts",
    responses((status = 200, description = "Current alert rules and triggered alerts", body = AlertStatus)),
    tag = "alerts"
)]
pub async fn get_alerts_handler(State(state): State<AppState>) -> Json<AlertStatus> {
    Json(state.ticker.alert_status().await)
}

#[utoipa::path(
    put,
    path = "/v1/alerts",
    request_body = AlertRulesRequest,
    responses(
        (status = 200, description = "Alert rules activated", body = AlertStatus),
        (status = 400, description = "No threshold or an invalid threshold", body = ErrorResponse,
            example = json!({"error": "Please set at least one price alert threshold"})
        ),
        (status = 415, description = "Body is not JSON", body = ErrorResponse),
        (status = 422, description = "Body does not match the request schema", body = ErrorResponse)
    ),
    tag = "alerts"
)]
#[instrument(skip(state))]
pub async fn set_alerts_handler(
    State(state): State<AppState>,
    request: Result<Json<AlertRulesRequest>, JsonRejection>,
) -> Result<Json<AlertStatus>, ApiError> {
    let request = parsed_body(request)?;
    state
        .ticker
        .set_alert_rules(request.above, request.below)
        .await
        .map(Json)
        .map_err(|e| bad_request(&e.to_string(), None))
}

#[utoipa::path(
    delete,
    path = "/v1/alerts",
    responses((status = 200, description = "Alert rules deactivated", body = AlertStatus)),
    tag = "alerts"
)]
pub async fn deactivate_alerts_handler(State(state): State<AppState>) -> Json<AlertStatus> {
    Json(state.ticker.deactivate_alerts().await)
}
