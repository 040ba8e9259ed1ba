use crate::api::state::AppState;
use crate::domain::DataOrigin;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dependencies: HealthDependencies,
}

#[derive(Serialize, ToSchema)]
pub struct HealthDependencies {
    /// Origin of the latest spot price: "live", "fallback" or "unknown"
    pub price_api: String,
}

/// Liveness plus the state of the upstream price API.
///
/// The gateway keeps serving fallback data when the upstream is down, so a
/// failing upstream reports `degraded` rather than an error status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Health check passed", body = HealthResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let price_api = match state.ticker.snapshot().await.map(|s| s.origin) {
        Some(DataOrigin::Live) => "live",
        Some(DataOrigin::Fallback) => "fallback",
        None => "unknown",
    };

    let status = if price_api == "fallback" {
        "degraded"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: VERSION.to_string(),
        dependencies: HealthDependencies {
            price_api: price_api.to_string(),
        },
    })
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "system",
    responses(
        (status = 200, description = "Prometheus metrics", content_type = "text/plain"),
        (status = 503, description = "Metrics recorder not installed")
    )
)]
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed".to_string(),
        ),
    }
}
