use crate::api::doc::ApiDoc;
use crate::api::handlers::{health_handler, metrics_handler};
use crate::api::price_handlers::{
    // Price handlers
    chart_handler, comparison_handler, current_price_handler, history_handler,
    outlook_handler, predictions_handler, upcoming_handler,
    // Dashboard & insight handlers
    confidence_handler, dashboard_handler, news_handler, sentiment_handler, trends_handler,
    // Alert handlers
    deactivate_alerts_handler, get_alerts_handler, set_alerts_handler,
};
use crate::api::state::AppState;
use axum::{extract::MatchedPath, http::HeaderValue, routing::get, Router};

use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Build the CORS layer from a comma-separated origin list ("*" allows any).
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    if allowed_origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let origin_values: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if origin_values.is_empty() {
        tracing::warn!("No valid CORS origins found, falling back to permissive CORS");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origin_values))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(state: AppState, allowed_origins: &str) -> Router {
    // Create middleware stack with security headers and observability
    let middleware = ServiceBuilder::new()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let route = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(|p| p.as_str().to_string())
                        .unwrap_or_else(|| request.uri().path().to_string());

                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        route = %route,
                        uri = %request.uri()
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, _span: &tracing::Span| {
                        let status = response.status().as_u16();
                        let status_class = format!("{}xx", status / 100);

                        metrics::counter!(
                            "http_requests_total",
                            "status" => status.to_string(),
                            "status_class" => status_class
                        )
                        .increment(1);
                        metrics::histogram!("http_request_duration_seconds", "status" => status.to_string())
                            .record(latency.as_secs_f64());

                        if latency.as_millis() > 1000 {
                            tracing::warn!("Slow HTTP request: {}ms", latency.as_millis());
                        }
                    },
                )
                .on_failure(
                    |_error: tower_http::classify::ServerErrorsFailureClass,
                     _latency: Duration,
                     _span: &tracing::Span| {
                        metrics::counter!("http_requests_total", "status" => "error", "status_class" => "5xx")
                            .increment(1);
                    },
                ),
        )
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(60),
        ))
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            axum::http::header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(cors_layer(allowed_origins));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // System endpoints (no versioning)
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // OpenAPI spec (downloadable)
        .route("/v1/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        // Price pipeline
        .route("/v1/price", get(current_price_handler))
        .route("/v1/price/history", get(history_handler))
        .route("/v1/price/predictions", get(predictions_handler))
        .route("/v1/price/predictions/upcoming", get(upcoming_handler))
        .route("/v1/price/comparison", get(comparison_handler))
        .route("/v1/price/chart", get(chart_handler))
        .route("/v1/price/outlook/{timeframe}", get(outlook_handler))
        // Dashboard & insights
        .route("/v1/dashboard", get(dashboard_handler))
        .route("/v1/insights/news", get(news_handler))
        .route("/v1/insights/sentiment", get(sentiment_handler))
        .route("/v1/insights/confidence", get(confidence_handler))
        .route("/v1/insights/trends", get(trends_handler))
        // Alerts
        .route(
            "/v1/alerts",
            get(get_alerts_handler)
                .put(set_alerts_handler)
                .delete(deactivate_alerts_handler),
        )
        .layer(middleware)
        .with_state(state)
}
