//! BTC Price Gateway
//!
//! A REST gateway serving Bitcoin spot, historical and predicted prices from
//! the CoinGecko v3 API, with deterministic fallback data whenever the
//! upstream is unavailable.
//!
//! # Architecture
//!
//! The API follows clean/onion architecture:
//! - **Domain**: price points, timeframes and the capability traits
//! - **Application**: the price pipeline, derived views, ticker and alerts
//! - **Infrastructure**: CoinGecko client, clocks and randomness sources
//! - **API**: HTTP handlers, routing and middleware
//!
//! # Configuration
//!
//! The server reads `config.yaml` (or `CONFIG_PATH`) and falls back to
//! defaults when the file is missing. Environment overrides:
//! - `PORT`: listen port
//! - `PRICE_API_BASE_URL`: alternative CoinGecko-compatible endpoint
//! - `RUST_LOG`: logging level (default: info)
//! - `LOG_FORMAT`: `json` for structured logs
//!
//! # Quick Start
//!
//! ```bash
//! cargo run --release
//!
//! curl http://localhost:3010/health
//! curl http://localhost:3010/v1/price
//! curl "http://localhost:3010/v1/price/history?days=30&timeframe=7d"
//! ```

use anyhow::Context;
use btc_price_gateway::api::routes::create_router;
use btc_price_gateway::api::state::AppState;
use btc_price_gateway::application::{PriceDataService, PriceTicker};
use btc_price_gateway::config::AppConfig;
use btc_price_gateway::infrastructure::CoinGeckoClient;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::env;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = EnvFilter::new(env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));

    if log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load Config
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    let mut config = AppConfig::load(&config_path)?;
    config.apply_env_overrides();

    let metrics = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
            None
        }
    };

    // Infrastructure
    let client = CoinGeckoClient::with_options(
        &config.price_api.base_url,
        config.price_api.timeout(),
        &config.price_api.user_agent,
    )?;
    tracing::info!("Price API: {}", client.base_url());

    // Application
    let price_service = Arc::new(PriceDataService::with_defaults(Arc::new(client)));
    let ticker = Arc::new(PriceTicker::new(
        price_service.clone(),
        config.ticker.refresh_interval(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ticker_task = ticker.clone().spawn(shutdown_rx);
    tracing::info!(
        "Spot price ticker refreshing every {}s",
        config.ticker.refresh_interval_secs
    );

    let state = AppState::new(price_service, ticker, metrics);
    let app = create_router(state, &config.server.allowed_origins);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", addr))?;
    tracing::info!("BTC price gateway running at http://{}", addr);

    // Graceful shutdown handling
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error during operation")?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = ticker_task.await {
        tracing::warn!("Ticker task ended abnormally: {}", e);
    }

    Ok(())
}

/// Wait for SIGTERM or SIGINT (Ctrl+C) to initiate graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
