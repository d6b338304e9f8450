//! Periodic WebSocket updates.
//!
//! Monitor changes are pushed as they happen by the observer. The
//! broadcaster additionally sends an update at a fixed interval so price
//! ages and stale badges refresh while the feeds are quiet.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::state::DashboardState;

pub async fn run_broadcaster(state: DashboardState, interval_ms: u64, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                debug!("Broadcaster stopped");
                return;
            }
            _ = interval.tick() => {
                state.broadcast(&state.collect_update());
            }
        }
    }
}
