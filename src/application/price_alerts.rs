//! Price threshold alerts.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Above/below price thresholds watched by the ticker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct AlertRules {
    /// Alert when the price rises above this value (USD)
    pub above: Option<f64>,
    /// Alert when the price falls below this value (USD)
    pub below: Option<f64>,
    /// Whether the rules are being evaluated
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Above,
    Below,
}

/// A threshold crossed by an observed price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TriggeredAlert {
    pub kind: AlertKind,
    pub threshold: f64,
    pub price: f64,
    pub at: DateTime<Utc>,
}

impl AlertRules {
    /// Build active rules.
    ///
    /// At least one threshold is required and every threshold must be a
    /// positive, finite price.
    pub fn new(above: Option<f64>, below: Option<f64>) -> Result<Self> {
        if above.is_none() && below.is_none() {
            anyhow::bail!("Please set at least one price alert threshold");
        }
        for threshold in [above, below].into_iter().flatten() {
            anyhow::ensure!(
                threshold.is_finite() && threshold > 0.0,
                "Invalid price alert threshold: {}",
                threshold
            );
        }
        Ok(Self {
            above,
            below,
            active: true,
        })
    }

    /// Same thresholds, no longer evaluated
    pub fn deactivated(self) -> Self {
        Self {
            active: false,
            ..self
        }
    }

    /// Thresholds crossed by `price`; nothing when inactive.
    pub fn evaluate(&self, price: f64, at: DateTime<Utc>) -> Vec<TriggeredAlert> {
        if !self.active {
            return Vec::new();
        }

        let mut triggered = Vec::new();
        if let Some(threshold) = self.above.filter(|t| price > *t) {
            triggered.push(TriggeredAlert {
                kind: AlertKind::Above,
                threshold,
                price,
                at,
            });
        }
        if let Some(threshold) = self.below.filter(|t| price < *t) {
            triggered.push(TriggeredAlert {
                kind: AlertKind::Below,
                threshold,
                price,
                at,
            });
        }
        triggered
    }

    /// One-line summary of what the rules watch for.
    ///
    /// # Examples
    ///
    /// ```
    /// use btc_price_gateway::application::price_alerts::AlertRules;
    ///
    /// let rules = AlertRules::new(Some(90000.0), Some(70000.0)).unwrap();
    /// assert_eq!(
    ///     rules.describe(),
    ///     "notify when BTC price exceeds $90000 or falls below $70000"
    /// );
    /// ```
    pub fn describe(&self) -> String {
        let conditions: Vec<String> = [
            self.above.map(|t| format!("exceeds ${}", t)),
            self.below.map(|t| format!("falls below ${}", t)),
        ]
        .into_iter()
        .flatten()
        .collect();

        if conditions.is_empty() {
            "no price alerts set".to_string()
        } else {
            format!("notify when BTC price {}", conditions.join(" or "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_rules_require_a_threshold() {
        let err = AlertRules::new(None, None).unwrap_err();
        assert_eq!(err.to_string(), "Please set at least one price alert threshold");
    }

    #[test]
    fn test_rules_reject_invalid_thresholds() {
        assert!(AlertRules::new(Some(-5.0), None).is_err());
        assert!(AlertRules::new(None, Some(f64::INFINITY)).is_err());
        assert!(AlertRules::new(Some(0.0), Some(10.0)).is_err());
    }

    #[test]
    fn test_evaluate_thresholds_are_strict() {
        let rules = AlertRules::new(Some(90_000.0), Some(70_000.0)).unwrap();

        assert!(rules.evaluate(80_000.0, now()).is_empty());
        assert!(rules.evaluate(90_000.0, now()).is_empty());
        assert!(rules.evaluate(70_000.0, now()).is_empty());

        let above = rules.evaluate(90_000.01, now());
        assert_eq!(above.len(), 1);
        assert_eq!(above[0].kind, AlertKind::Above);
        assert_eq!(above[0].threshold, 90_000.0);

        let below = rules.evaluate(65_000.0, now());
        assert_eq!(below[0].kind, AlertKind::Below);
        assert_eq!(below[0].price, 65_000.0);
    }

    #[test]
    fn test_deactivated_rules_stay_silent() {
        let rules = AlertRules::new(Some(1.0), None).unwrap().deactivated();
        assert!(!rules.active);
        assert_eq!(rules.above, Some(1.0));
        assert!(rules.evaluate(100.0, now()).is_empty());
    }

    #[test]
    fn test_describe_single_threshold() {
        let rules = AlertRules::new(None, Some(50_000.0)).unwrap();
        assert_eq!(rules.describe(), "notify when BTC price falls below $50000");
        assert_eq!(AlertRules::default().describe(), "no price alerts set");
    }
}
