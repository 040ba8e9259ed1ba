//! Market insight feeds shown next to the price charts.
//!
//! There is no news, sentiment or model backend behind these yet: each feed
//! returns fixed placeholder content, dated on the injected clock. The
//! classification helpers on the returned types are real.

use crate::domain::Clock;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Headline in the news feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub source: String,
    pub url: String,
    pub date: NaiveDate,
}

/// Share of positive / neutral / negative mentions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SentimentBreakdown {
    pub positive: u32,
    pub neutral: u32,
    pub negative: u32,
}

/// Overall market mood derived from a [`SentimentBreakdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SentimentOutlook {
    Bullish,
    Neutral,
    Bearish,
}

impl SentimentBreakdown {
    pub fn total(&self) -> u32 {
        self.positive + self.neutral + self.negative
    }

    /// Bullish when more than 60% of mentions are positive, Bearish when
    /// more than 60% are negative, Neutral otherwise (including no data).
    pub fn outlook(&self) -> SentimentOutlook {
        let total = self.total();
        if total == 0 {
            return SentimentOutlook::Neutral;
        }
        let share = |n: u32| f64::from(n) / f64::from(total) * 100.0;

        if share(self.positive) > 60.0 {
            SentimentOutlook::Bullish
        } else if share(self.negative) > 60.0 {
            SentimentOutlook::Bearish
        } else {
            SentimentOutlook::Neutral
        }
    }
}

/// Sentiment feed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SentimentReport {
    #[serde(flatten)]
    pub breakdown: SentimentBreakdown,
    pub outlook: SentimentOutlook,
}

/// Bucketed prediction confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ConfidenceLevel {
    #[serde(rename = "Very High")]
    VeryHigh,
    High,
    Moderate,
    Low,
    #[serde(rename = "Very Low")]
    VeryLow,
}

impl ConfidenceLevel {
    /// Bucket a 0-100 confidence score.
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_price_gateway::application::insights::ConfidenceLevel;
    ///
    /// assert_eq!(ConfidenceLevel::from_score(80), ConfidenceLevel::VeryHigh);
    /// assert_eq!(ConfidenceLevel::from_score(45), ConfidenceLevel::Moderate);
    /// assert_eq!(ConfidenceLevel::from_score(3), ConfidenceLevel::VeryLow);
    /// ```
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => ConfidenceLevel::VeryHigh,
            60..=79 => ConfidenceLevel::High,
            40..=59 => ConfidenceLevel::Moderate,
            20..=39 => ConfidenceLevel::Low,
            _ => ConfidenceLevel::VeryLow,
        }
    }
}

/// Confidence feed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConfidenceReport {
    /// Score in percent
    pub confidence: u8,
    pub level: ConfidenceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendAlertKind {
    Positive,
    Warning,
    Negative,
}

/// Pattern-based market alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TrendAlert {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TrendAlertKind,
    pub message: String,
}

/// Placeholder insight feeds
#[derive(Clone)]
pub struct InsightsService {
    clock: Arc<dyn Clock>,
}

impl InsightsService {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Latest Bitcoin headlines, dated today
    pub fn news(&self) -> Vec<NewsItem> {
        let today = self.clock.now().date_naive();
        [
            (
                "Bitcoin Hits New All-Time High as Institutional Interest Grows",
                "CryptoNews",
            ),
            (
                "Major Bank Announces Bitcoin Custody Services for Clients",
                "Financial Times",
            ),
            ("Bitcoin Mining Difficulty Reaches Record Levels", "CoinDesk"),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (title, source))| NewsItem {
            id: (i + 1).to_string(),
            title: title.to_string(),
            source: source.to_string(),
            url: "#".to_string(),
            date: today,
        })
        .collect()
    }

    pub fn sentiment(&self) -> SentimentReport {
        let breakdown = SentimentBreakdown {
            positive: 65,
            neutral: 20,
            negative: 15,
        };
        SentimentReport {
            outlook: breakdown.outlook(),
            breakdown,
        }
    }

    pub fn prediction_confidence(&self) -> ConfidenceReport {
        let confidence = 80;
        ConfidenceReport {
            confidence,
            level: ConfidenceLevel::from_score(confidence),
        }
    }

    pub fn trend_alerts(&self) -> Vec<TrendAlert> {
        vec![
            TrendAlert {
                id: "1".to_string(),
                kind: TrendAlertKind::Positive,
                message: "Current trend resembles November 2020 surge pattern".to_string(),
            },
            TrendAlert {
                id: "2".to_string(),
                kind: TrendAlertKind::Warning,
                message: "Potential short-term volatility expected in next 24-48 hours"
                    .to_string(),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::FixedClock;
    use chrono::{TimeZone, Utc};

    fn service() -> InsightsService {
        InsightsService::new(Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2025, 4, 2, 9, 30, 0).unwrap(),
        )))
    }

    #[test]
    fn test_sentiment_outlook_thresholds() {
        let bullish = SentimentBreakdown { positive: 65, neutral: 20, negative: 15 };
        assert_eq!(bullish.outlook(), SentimentOutlook::Bullish);

        let bearish = SentimentBreakdown { positive: 10, neutral: 20, negative: 70 };
        assert_eq!(bearish.outlook(), SentimentOutlook::Bearish);

        // Exactly 60% is not enough
        let even = SentimentBreakdown { positive: 60, neutral: 40, negative: 0 };
        assert_eq!(even.outlook(), SentimentOutlook::Neutral);

        let empty = SentimentBreakdown { positive: 0, neutral: 0, negative: 0 };
        assert_eq!(empty.outlook(), SentimentOutlook::Neutral);
    }

    #[test]
    fn test_confidence_buckets() {
        assert_eq!(ConfidenceLevel::from_score(100), ConfidenceLevel::VeryHigh);
        assert_eq!(ConfidenceLevel::from_score(79), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(60), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::from_score(40), ConfidenceLevel::Moderate);
        assert_eq!(ConfidenceLevel::from_score(20), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(19), ConfidenceLevel::VeryLow);
    }

    #[test]
    fn test_feeds() {
        let svc = service();

        let news = svc.news();
        assert_eq!(news.len(), 3);
        assert_eq!(news[2].source, "CoinDesk");
        assert!(news.iter().all(|n| n.date == NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()));

        let sentiment = svc.sentiment();
        assert_eq!(sentiment.breakdown.total(), 100);
        assert_eq!(sentiment.outlook, SentimentOutlook::Bullish);

        let confidence = svc.prediction_confidence();
        assert_eq!(confidence.confidence, 80);
        assert_eq!(confidence.level, ConfidenceLevel::VeryHigh);

        let alerts = svc.trend_alerts();
        assert_eq!(alerts[1].kind, TrendAlertKind::Warning);
    }

    #[test]
    fn test_serialized_shapes() {
        let svc = service();
        let sentiment = serde_json::to_value(svc.sentiment()).unwrap();
        assert_eq!(sentiment["positive"], 65);
        assert_eq!(sentiment["outlook"], "Bullish");

        let confidence = serde_json::to_value(svc.prediction_confidence()).unwrap();
        assert_eq!(confidence["level"], "Very High");

        let alert = serde_json::to_value(&svc.trend_alerts()[0]).unwrap();
        assert_eq!(alert["type"], "positive");
    }
}
