//! Application configuration.

use crate::error::{AppError, AppResult};
use cexdex_core::ThresholdConfig;
use cexdex_dashboard::DashboardConfig;
use cexdex_detector::MonitorConfig;
use cexdex_ws::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feed timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Pool polling interval (ms).
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Pool request timeout (ms).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// A source with no update for this long is shown as stale (ms).
    #[serde(default = "default_stale_after_ms")]
    pub stale_after_ms: i64,
    /// Capacity of the stream and poll channels into the event loop.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_poll_interval_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_stale_after_ms() -> i64 {
    30_000
}

fn default_channel_capacity() -> usize {
    1000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            stale_after_ms: default_stale_after_ms(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    cexdex_telemetry::logging::DEFAULT_FILTER.to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Trade stream WebSocket URL.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Trade stream symbol, lowercase (e.g. "btcusdc").
    #[serde(default = "default_symbol")]
    pub symbol: String,
    /// Pool API base URL; the pool address is appended.
    #[serde(default = "default_pool_api_url")]
    pub pool_api_url: String,
    /// Pool contract address.
    #[serde(default = "default_pool_address")]
    pub pool_address: String,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_ws_url() -> String {
    "wss://stream.binance.com:9443/ws".to_string()
}

fn default_symbol() -> String {
    "btcusdc".to_string()
}

fn default_pool_api_url() -> String {
    "https://api.geckoterminal.com/api/v2/networks/base/pools/".to_string()
}

fn default_pool_address() -> String {
    "0x4e962BB3889Bf030368F56810A9c96B83CB3E778".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            symbol: default_symbol(),
            pool_api_url: default_pool_api_url(),
            pool_address: default_pool_address(),
            thresholds: ThresholdConfig::default(),
            monitor: MonitorConfig::default(),
            feed: FeedConfig::default(),
            dashboard: DashboardConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a specific file.
    pub fn from_file(path: impl AsRef<Path>) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> AppResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    ///
    /// The flag is `false` when defaults were used.
    pub fn load_or_default(path: impl AsRef<Path>) -> AppResult<(Self, bool)> {
        if path.as_ref().exists() {
            Ok((Self::from_file(path)?, true))
        } else {
            Ok((Self::default(), false))
        }
    }

    /// Numeric sanity only; URLs and addresses are taken as given.
    pub fn validate(&self) -> AppResult<()> {
        self.thresholds
            .validate()
            .map_err(|e| AppError::Config(format!("thresholds: {e}")))?;
        if self.feed.poll_interval_ms == 0 {
            return Err(AppError::Config(
                "feed.poll_interval_ms must be positive".to_string(),
            ));
        }
        if self.feed.channel_capacity == 0 {
            return Err(AppError::Config(
                "feed.channel_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Stream name for the trade subscription, e.g. "btcusdc@trade".
    pub fn stream_name(&self) -> String {
        format!("{}@trade", self.symbol.to_lowercase())
    }

    pub fn connection_config(&self) -> ConnectionConfig {
        ConnectionConfig {
            url: self.ws_url.clone(),
            streams: vec![self.stream_name()],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.stream_name(), "btcusdc@trade");
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert!(config.monitor.initial_armed);
        assert_eq!(config.monitor.first_sequence, 1);
        assert_eq!(config.feed.poll_interval_ms, 10_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.ws_url, "wss://stream.binance.com:9443/ws");
        assert_eq!(config.dashboard.streamed_label, "Binance (BTC/USD)");
    }

    #[test]
    fn test_partial_sections() {
        let config = AppConfig::from_toml(
            r#"
            symbol = "BTCUSDC"

            [thresholds]
            max_diff = 3.5

            [monitor]
            initial_armed = false

            [feed]
            poll_interval_ms = 500
            "#,
        )
        .unwrap();
        assert_eq!(config.stream_name(), "btcusdc@trade");
        assert_eq!(config.thresholds.min_diff, 1.0);
        assert_eq!(config.thresholds.max_diff, 3.5);
        assert!(!config.monitor.initial_armed);
        assert_eq!(config.feed.poll_interval_ms, 500);
        assert_eq!(config.feed.request_timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_toml("[thresholds]\nmin_diff = -1.0").is_err());
        assert!(AppConfig::from_toml("[feed]\npoll_interval_ms = 0").is_err());
        assert!(AppConfig::from_toml("ws_url = 3").is_err());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let (config, found) = AppConfig::load_or_default("does/not/exist.toml").unwrap();
        assert!(!found);
        assert_eq!(config.symbol, "btcusdc");
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/default.toml");
        let config = AppConfig::from_file(path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(config.ws_url, defaults.ws_url);
        assert_eq!(config.pool_address, defaults.pool_address);
        assert_eq!(config.thresholds, defaults.thresholds);
        assert_eq!(config.monitor, defaults.monitor);
        assert_eq!(config.dashboard.port, defaults.dashboard.port);
        assert_eq!(config.telemetry.log_filter, defaults.telemetry.log_filter);
    }

    #[test]
    fn test_connection_config() {
        let ws = AppConfig::default().connection_config();
        assert_eq!(ws.streams, vec!["btcusdc@trade".to_string()]);
        assert_eq!(ws.subscribe_id, 1);
    }
}
