//! Periodic spot-price refresh.
//!
//! Every interval the ticker fires a fetch task and does not wait for it:
//! overlapping fetches are neither de-duplicated nor cancelled, and whichever
//! response lands last becomes the current snapshot. Active price alert rules
//! are evaluated against every new price.

use crate::application::analytics::change_percent;
use crate::application::price_alerts::{AlertRules, TriggeredAlert};
use crate::application::PriceDataService;
use crate::domain::{DataOrigin, Sourced};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Default refresh cadence in seconds
pub const DEFAULT_REFRESH_SECS: u64 = 30;

/// Latest spot price together with the one it replaced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub price: f64,
    /// Price before this update; 0 on the first update
    pub previous_price: f64,
    /// Change from `previous_price`, 0 when there is no previous price
    pub change_percent: f64,
    pub origin: DataOrigin,
    pub updated_at: DateTime<Utc>,
}

/// Alert rules and the alerts raised by the latest price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AlertStatus {
    pub rules: AlertRules,
    pub description: String,
    pub triggered: Vec<TriggeredAlert>,
}

#[derive(Debug, Default)]
struct TickerState {
    snapshot: Option<PriceSnapshot>,
    rules: AlertRules,
    triggered: Vec<TriggeredAlert>,
}

/// Spot price ticker
pub struct PriceTicker {
    prices: Arc<PriceDataService>,
    interval: Duration,
    state: RwLock<TickerState>,
}

impl PriceTicker {
    /// Create a ticker; a zero `interval` selects [`DEFAULT_REFRESH_SECS`].
    pub fn new(prices: Arc<PriceDataService>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                "Zero ticker interval requested, using {}s",
                DEFAULT_REFRESH_SECS
            );
            Duration::from_secs(DEFAULT_REFRESH_SECS)
        } else {
            interval
        };

        Self {
            prices,
            interval,
            state: RwLock::new(TickerState::default()),
        }
    }

    /// Fetch the spot price now and publish it
    pub async fn refresh(&self) -> PriceSnapshot {
        let price = self.prices.fetch_current_price().await;
        self.publish(price).await
    }

    /// Latest published snapshot, if any update has landed yet
    pub async fn snapshot(&self) -> Option<PriceSnapshot> {
        self.state.read().await.snapshot.clone()
    }

    /// Latest snapshot, fetching one first if nothing has been published
    pub async fn latest(&self) -> PriceSnapshot {
        match self.snapshot().await {
            Some(snapshot) => snapshot,
            None => self.refresh().await,
        }
    }

    async fn publish(&self, price: Sourced<f64>) -> PriceSnapshot {
        let now = self.prices.clock().now();
        let origin = price.origin();
        let price = price.into_inner();

        let mut state = self.state.write().await;
        let previous_price = state.snapshot.as_ref().map_or(0.0, |s| s.price);
        let snapshot = PriceSnapshot {
            price,
            previous_price,
            change_percent: change_percent(price, previous_price),
            origin,
            updated_at: now,
        };
        debug!("Published price {} (previous {})", price, previous_price);

        if state.rules.active {
            let triggered = state.rules.evaluate(price, now);
            for alert in &triggered {
                warn!(
                    "Price alert: BTC at {} crossed {:?} threshold {}",
                    alert.price, alert.kind, alert.threshold
                );
                metrics::counter!("price_alerts_triggered_total").increment(1);
            }
            state.triggered = triggered;
        }

        state.snapshot = Some(snapshot.clone());
        snapshot
    }

    // ========================================================================
    // Alert Rules
    // ========================================================================

    /// Replace the alert rules and activate them
    pub async fn set_alert_rules(
        &self,
        above: Option<f64>,
        below: Option<f64>,
    ) -> anyhow::Result<AlertStatus> {
        let rules = AlertRules::new(above, below)?;
        info!("Alerts activated: {}", rules.describe());

        let mut state = self.state.write().await;
        state.rules = rules;
        state.triggered.clear();
        Ok(Self::status_of(&state))
    }

    /// Stop evaluating the alert rules, keeping the thresholds
    pub async fn deactivate_alerts(&self) -> AlertStatus {
        let mut state = self.state.write().await;
        state.rules = state.rules.deactivated();
        state.triggered.clear();
        info!("Price alerts have been turned off");
        Self::status_of(&state)
    }

    pub async fn alert_status(&self) -> AlertStatus {
        Self::status_of(&*self.state.read().await)
    }

    fn status_of(state: &TickerState) -> AlertStatus {
        AlertStatus {
            rules: state.rules,
            description: state.rules.describe(),
            triggered: state.triggered.clone(),
        }
    }

    // ========================================================================
    // Refresh Loop
    // ========================================================================

    /// Run the refresh loop until `shutdown` flips to `true` or its sender
    /// is dropped. The first tick fires immediately.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(self.interval);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Price ticker started: refreshing every {:?}", self.interval);

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let ticker = self.clone();
                        tokio::spawn(async move {
                            ticker.refresh().await;
                        });
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            info!("Price ticker stopped");
                            break;
                        }
                    }
                }
            }
        })
    }
}
