//! Derived views over price series.
//!
//! Pure functions consumed by the dashboard: change percentages, the
//! actual-vs-predicted comparison, timeframe filtering, chart merging and
//! per-timeframe outlooks. None of them touch the network; "now" and
//! randomness are passed in.

use crate::domain::{PricePoint, RandomSource, Timeframe};
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Days of history the comparison view looks back over.
const COMPARISON_WINDOW_DAYS: i64 = 5;

/// Upcoming predictions shown after "today".
const UPCOMING_PREDICTIONS: usize = 7;

/// Actual vs predicted price on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComparisonRow {
    /// Calendar day (UTC)
    pub date: NaiveDate,
    /// Observed price
    pub actual: f64,
    /// Predicted price for the same day, if any
    pub predicted: Option<f64>,
    /// `(actual - predicted) / predicted * 100`, 0 when unmatched
    pub difference: f64,
}

/// One x-axis position on the combined historical + predicted chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_price: Option<f64>,
}

/// A predicted price with its change relative to today's prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PredictionDelta {
    pub date: DateTime<Utc>,
    pub price: f64,
    pub change_percent: f64,
}

/// One horizon step of a timeframe outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OutlookPoint {
    pub date: DateTime<Utc>,
    /// Human label of the step (`+4h`, `Day 3`, `Week 2`, `Month 11`)
    pub interval: String,
    pub price: f64,
    pub change_percent: f64,
}

/// Forward outlook over one timeframe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeOutlook {
    pub timeframe: Timeframe,
    pub title: String,
    pub current_price: f64,
    pub points: Vec<OutlookPoint>,
}

/// Percentage change from `current` to `predicted`.
///
/// Returns `0.0` when `current` is zero.
///
/// # Examples
///
/// ```
/// use btc_price_gateway::application::analytics::change_percent;
///
/// assert_eq!(change_percent(84_000.0, 80_000.0), 5.0);
/// assert_eq!(change_percent(84_000.0, 0.0), 0.0);
/// ```
pub fn change_percent(predicted: f64, current: f64) -> f64 {
    if current == 0.0 {
        return 0.0;
    }
    (predicted - current) / current * 100.0
}

/// Points of `series` no older than `timeframe` before `now` (inclusive).
pub fn filter_by_timeframe(
    series: &[PricePoint],
    timeframe: Timeframe,
    now: DateTime<Utc>,
) -> Vec<PricePoint> {
    let cutoff = now - timeframe.span();
    series
        .iter()
        .filter(|point| point.date >= cutoff)
        .copied()
        .collect()
}

/// Align the last five days of history with predictions on the same day.
///
/// Takes the historical points dated within five days of `now`, keeps the
/// last five, and pairs each with the first prediction on the same UTC
/// calendar day. Unmatched days (or a matched prediction of zero) report
/// no difference rather than being dropped.
pub fn compare_recent(
    historical: &[PricePoint],
    predicted: &[PricePoint],
    now: DateTime<Utc>,
) -> Vec<ComparisonRow> {
    if historical.is_empty() || predicted.is_empty() {
        return Vec::new();
    }

    let cutoff = now - Duration::days(COMPARISON_WINDOW_DAYS);
    let recent: Vec<&PricePoint> = historical.iter().filter(|p| p.date >= cutoff).collect();
    let start = recent.len().saturating_sub(COMPARISON_WINDOW_DAYS as usize);

    recent[start..]
        .iter()
        .map(|actual| {
            let day = actual.date.date_naive();
            let matched = predicted
                .iter()
                .find(|p| p.date.date_naive() == day)
                .map(|p| p.price)
                .filter(|price| *price != 0.0);

            ComparisonRow {
                date: day,
                actual: actual.price,
                predicted: matched,
                difference: matched.map_or(0.0, |p| difference_percent(actual.price, p)),
            }
        })
        .collect()
}

/// How far `actual` landed from `predicted`, as a percentage of `predicted`.
pub fn difference_percent(actual: f64, predicted: f64) -> f64 {
    if predicted == 0.0 {
        return 0.0;
    }
    (actual - predicted) / predicted * 100.0
}

/// Combine history and predictions into one chart series.
///
/// A prediction sharing an instant with a historical point is merged into
/// it; the rest are appended in their own order.
pub fn merge_chart_series(historical: &[PricePoint], predicted: &[PricePoint]) -> Vec<ChartPoint> {
    let mut combined: Vec<ChartPoint> = historical
        .iter()
        .map(|p| ChartPoint {
            date: p.date,
            price: Some(p.price),
            predicted_price: None,
        })
        .collect();

    for prediction in predicted {
        match combined.iter_mut().find(|c| c.date == prediction.date) {
            Some(existing) => existing.predicted_price = Some(prediction.price),
            None => combined.push(ChartPoint {
                date: prediction.date,
                price: None,
                predicted_price: Some(prediction.price),
            }),
        }
    }

    combined
}

/// Predictions after today (up to seven), with change against today's.
pub fn upcoming_predictions(predicted: &[PricePoint]) -> Vec<PredictionDelta> {
    let today = predicted.first().map_or(0.0, |p| p.price);
    predicted
        .iter()
        .skip(1)
        .take(UPCOMING_PREDICTIONS)
        .map(|p| PredictionDelta {
            date: p.date,
            price: p.price,
            change_percent: change_percent(p.price, today),
        })
        .collect()
}

/// Card title for a timeframe outlook.
pub fn outlook_title(timeframe: Timeframe) -> &'static str {
    match timeframe {
        Timeframe::Day => "Next 24 Hours",
        Timeframe::Week => "Next 7 Days",
        Timeframe::Month => "Next 30 Days",
        Timeframe::Year => "Next 12 Months",
    }
}

/// Horizon steps for a timeframe: every 4 hours over a day, daily over a
/// week, weekly over a month, monthly over a year.
fn horizon(timeframe: Timeframe, now: DateTime<Utc>) -> Vec<(DateTime<Utc>, String)> {
    match timeframe {
        Timeframe::Day => (1..=6)
            .filter_map(|i| {
                let date = now.checked_add_signed(Duration::hours(i * 4))?;
                Some((date, format!("+{}h", i * 4)))
            })
            .collect(),
        Timeframe::Week => (1..=7)
            .filter_map(|i| {
                let date = now.checked_add_signed(Duration::days(i))?;
                Some((date, format!("Day {}", i)))
            })
            .collect(),
        Timeframe::Month => (1..=4)
            .filter_map(|i| {
                let date = now.checked_add_signed(Duration::days(i * 7))?;
                Some((date, format!("Week {}", i)))
            })
            .collect(),
        Timeframe::Year => (1..=12u32)
            .filter_map(|i| {
                let date = now.checked_add_months(Months::new(i))?;
                Some((date, format!("Month {}", i)))
            })
            .collect(),
    }
}

/// Rough forward outlook from `current` over `timeframe`.
///
/// Step `k` (0-based) is priced at `current * (1 + d * (k + 1))` where `d`
/// is drawn uniformly from `[-1%, +1%]` for every step, so the spread
/// widens with the horizon.
pub fn timeframe_outlook(
    current: f64,
    timeframe: Timeframe,
    now: DateTime<Utc>,
    rng: &dyn RandomSource,
) -> TimeframeOutlook {
    let points = horizon(timeframe, now)
        .into_iter()
        .enumerate()
        .map(|(index, (date, interval))| {
            let drift = rng.unit() * 0.02 - 0.01;
            let price = current * (1.0 + drift * (index as f64 + 1.0));
            OutlookPoint {
                date,
                interval,
                price,
                change_percent: change_percent(price, current),
            }
        })
        .collect();

    TimeframeOutlook {
        timeframe,
        title: outlook_title(timeframe).to_string(),
        current_price: current,
        points,
    }
}
