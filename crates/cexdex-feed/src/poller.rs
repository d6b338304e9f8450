//! Timer-driven pool price polling.

use crate::error::FeedResult;
use crate::pool_client::PoolClient;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default polling interval.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

/// Poll `client` until `cancel` fires, sending every result to `tx`.
///
/// The first fetch happens immediately. Errors are forwarded like prices
/// so the receiver can mark the source stale. Returns when cancelled or
/// when the receiver is dropped.
pub async fn run_poller(
    client: PoolClient,
    config: PollerConfig,
    tx: mpsc::Sender<FeedResult<f64>>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.interval);
    // A slow request must not cause a burst of catch-up fetches
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        url = %client.url(),
        interval_ms = config.interval.as_millis() as u64,
        "Pool poller started"
    );

    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                info!("Pool poller cancelled");
                return;
            }

            _ = interval.tick() => {
                let result = tokio::select! {
                    () = cancel.cancelled() => {
                        info!("Pool poller cancelled during fetch");
                        return;
                    }
                    r = client.fetch_price() => r,
                };

                match &result {
                    Ok(price) => debug!(price, "Pool price fetched"),
                    Err(e) => warn!(error = %e, "Pool price fetch failed"),
                }

                if tx.send(result).await.is_err() {
                    warn!("Poll result receiver dropped, stopping poller");
                    return;
                }
            }
        }
    }
}
