//! Application configuration loaded from `config.yaml` and the environment.

use crate::application::price_ticker::DEFAULT_REFRESH_SECS;
use crate::infrastructure::coingecko_client::BASE_URL;
use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Server configuration (host, port, CORS origins)
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream price API configuration
    #[serde(default)]
    pub price_api: PriceApiConfig,
    /// Spot price refresh configuration
    #[serde(default)]
    pub ticker: TickerConfig,
}

/// Server configuration settings.
///
/// Defines how the HTTP server should bind and what CORS origins to allow.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Host address to bind to (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on (default: 3010)
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma-separated list of allowed CORS origins (default: "*")
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: String,
}

/// Upstream price API settings
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct PriceApiConfig {
    /// Base URL of the CoinGecko v3 API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct TickerConfig {
    /// Seconds between spot price refreshes (default: 30)
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3010
}
fn default_allowed_origins() -> String {
    "*".to_string()
}
fn default_base_url() -> String {
    BASE_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("BtcPriceGateway/{}", env!("CARGO_PKG_VERSION"))
}
fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for PriceApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl PriceApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TickerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl AppConfig {
    /// Parse a YAML configuration document
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .context("Failed to parse config.yaml - check YAML syntax and structure")?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "{} not found - using default configuration",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Apply `PORT` and `PRICE_API_BASE_URL` overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("PORT").ok(),
            std::env::var("PRICE_API_BASE_URL").ok(),
        );
    }

    fn apply_overrides(&mut self, port: Option<String>, base_url: Option<String>) {
        if let Some(port) = port.and_then(|p| p.parse::<u16>().ok()) {
            self.server.port = port;
        }
        if let Some(base_url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.price_api.base_url = base_url;
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.ticker.refresh_interval_secs > 0,
            "ticker.refresh_interval_secs must be greater than zero"
        );
        anyhow::ensure!(
            self.price_api.timeout_secs > 0,
            "price_api.timeout_secs must be greater than zero"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = AppConfig::from_yaml("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.port, 3010);
        assert_eq!(config.price_api.base_url, BASE_URL);
        assert_eq!(config.ticker.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "server:\n  port: 8080\n  allowed_origins: \"https://example.com\"\nprice_api:\n  base_url: \"http://localhost:9999\"\n  timeout_secs: 3\nticker:\n  refresh_interval_secs: 5"
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.allowed_origins, "https://example.com");
        assert_eq!(config.price_api.base_url, "http://localhost:9999");
        assert_eq!(config.price_api.timeout(), Duration::from_secs(3));
        assert_eq!(config.ticker.refresh_interval_secs, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_yaml("ticker:\n  refresh_interval_secs: 0").is_err());
        assert!(AppConfig::from_yaml("server: [1, 2").is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = AppConfig::default();
        config.apply_overrides(Some("4000".into()), Some("http://mirror".into()));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.price_api.base_url, "http://mirror");

        config.apply_overrides(Some("not-a-port".into()), Some("  ".into()));
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.price_api.base_url, "http://mirror");
    }
}
