//! Dashboard configuration.

use serde::{Deserialize, Serialize};

/// Dashboard server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Enable dashboard server.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interval in milliseconds for periodic WebSocket updates.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Maximum concurrent WebSocket connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Display label of the streamed price card.
    #[serde(default = "default_streamed_label")]
    pub streamed_label: String,
    /// Display label of the polled price card.
    #[serde(default = "default_polled_label")]
    pub polled_label: String,
}

fn default_enabled() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_update_interval_ms() -> u64 {
    1000
}

fn default_max_connections() -> usize {
    10
}

fn default_streamed_label() -> String {
    "Binance (BTC/USD)".to_string()
}

fn default_polled_label() -> String {
    "Aerodrome (cbBTC/USDC)".to_string()
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: default_host(),
            port: default_port(),
            update_interval_ms: default_update_interval_ms(),
            max_connections: default_max_connections(),
            streamed_label: default_streamed_label(),
            polled_label: default_polled_label(),
        }
    }
}
