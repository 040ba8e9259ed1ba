use crate::application::{DashboardService, InsightsService, PriceDataService, PriceTicker};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub price_service: Arc<PriceDataService>,
    pub ticker: Arc<PriceTicker>,
    pub insights: Arc<InsightsService>,
    pub dashboard: Arc<DashboardService>,
    /// Prometheus recorder handle; `None` when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Wire the services around one price pipeline
    pub fn new(
        price_service: Arc<PriceDataService>,
        ticker: Arc<PriceTicker>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        let insights = Arc::new(InsightsService::new(price_service.clock().clone()));
        let dashboard = Arc::new(DashboardService::new(
            price_service.clone(),
            insights.clone(),
        ));
        Self {
            price_service,
            ticker,
            insights,
            dashboard,
            metrics,
        }
    }
}
