pub mod analytics;
pub mod dashboard_service;
pub mod insights;
pub mod price_alerts;
pub mod price_service;
pub mod price_ticker;

pub use dashboard_service::DashboardService;
pub use insights::InsightsService;
pub use price_service::PriceDataService;
pub use price_ticker::PriceTicker;
