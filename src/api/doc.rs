use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        // System Handlers
        crate::api::handlers::health_handler,
        crate::api::handlers::metrics_handler,
        // Price Handlers
        crate::api::price_handlers::current_price_handler,
        crate::api::price_handlers::history_handler,
        crate::api::price_handlers::predictions_handler,
        crate::api::price_handlers::upcoming_handler,
        crate::api::price_handlers::comparison_handler,
        crate::api::price_handlers::chart_handler,
        crate::api::price_handlers::outlook_handler,
        crate::api::price_handlers::dashboard_handler,
        // Insight Handlers
        crate::api::price_handlers::news_handler,
        crate::api::price_handlers::sentiment_handler,
        crate::api::price_handlers::confidence_handler,
        crate::api::price_handlers::trends_handler,
        // Alert Handlers
        crate::api::price_handlers::get_alerts_handler,
        crate::api::price_handlers::set_alerts_handler,
        crate::api::price_handlers::deactivate_alerts_handler
    ),
    components(
        schemas(
            crate::api::handlers::HealthResponse,
            crate::api::handlers::HealthDependencies,
            crate::api::price_handlers::PriceSeriesResponse,
            crate::api::price_handlers::ChartResponse,
            crate::api::price_handlers::AlertRulesRequest,
            crate::api::price_handlers::ErrorResponse,
            crate::domain::PricePoint,
            crate::domain::DataOrigin,
            crate::domain::Timeframe,
            crate::application::analytics::ComparisonRow,
            crate::application::analytics::ChartPoint,
            crate::application::analytics::PredictionDelta,
            crate::application::analytics::OutlookPoint,
            crate::application::analytics::TimeframeOutlook,
            crate::application::insights::NewsItem,
            crate::application::insights::SentimentReport,
            crate::application::insights::SentimentOutlook,
            crate::application::insights::ConfidenceReport,
            crate::application::insights::ConfidenceLevel,
            crate::application::insights::TrendAlert,
            crate::application::insights::TrendAlertKind,
            crate::application::price_alerts::AlertRules,
            crate::application::price_alerts::AlertKind,
            crate::application::price_alerts::TriggeredAlert,
            crate::application::price_ticker::PriceSnapshot,
            crate::application::price_ticker::AlertStatus,
            crate::application::dashboard_service::DashboardResponse
        )
    ),
    tags(
        (name = "system", description = "System endpoints for health checks and metrics"),
        (name = "price", description = "Spot, historical and predicted Bitcoin prices with derived views"),
        (name = "dashboard", description = "Aggregated dashboard payload"),
        (name = "insights", description = "News, sentiment, confidence and trend feeds"),
        (name = "alerts", description = "Price alert thresholds")
    ),
    info(
        title = "BTC Price Gateway API",
        version = "0.1.0",
        description = "REST gateway for Bitcoin price data. Every price endpoint answers with live CoinGecko data when available and with clearly tagged fallback data otherwise."
    )
)]
pub struct ApiDoc;
