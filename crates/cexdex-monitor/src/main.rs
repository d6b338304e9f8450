//! CEX/DEX divergence monitor - entry point

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

/// Watches a CEX trade stream against a DEX pool price and logs
/// threshold crossings.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via CEXDEX_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS connection
    cexdex_ws::init_crypto();

    let args = Args::parse();

    // CLI arg > CEXDEX_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("CEXDEX_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let (config, found) = cexdex_monitor::AppConfig::load_or_default(&config_path)?;

    cexdex_telemetry::init_logging_with(&config.telemetry.log_filter)?;

    info!("Starting cexdex-monitor v{}", env!("CARGO_PKG_VERSION"));
    if found {
        info!(config_path = %config_path, "Configuration loaded");
    } else {
        warn!(config_path = %config_path, "Config file not found, using defaults");
    }
    info!(
        min_diff = config.thresholds.min_diff,
        max_diff = config.thresholds.max_diff,
        initial_armed = config.monitor.initial_armed,
        dashboard = config.dashboard.enabled,
        "Effective settings"
    );

    let app = cexdex_monitor::Application::new(config)?;
    app.run().await?;

    Ok(())
}
