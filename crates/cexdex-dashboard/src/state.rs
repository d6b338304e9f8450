//! Dashboard state management.
//!
//! DashboardState mirrors the monitor through [`MonitorObserver`] and
//! holds the shared threshold handle and feed health. It holds no
//! business logic of its own.

use std::sync::Arc;

use cexdex_core::{LogEntry, PriceSource};
use cexdex_detector::{EventLog, MonitorChange, MonitorObserver, MonitorView, ThresholdHandle};
use cexdex_feed::FeedHealth;
use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::config::DashboardConfig;
use crate::types::{
    DashboardMessage, DashboardSnapshot, DivergenceSnapshot, LogEntryView, LogPageView, PriceCard,
};

/// Broadcast buffer for slow WebSocket clients.
const BROADCAST_CAPACITY: usize = 64;

/// Display labels for the two cards.
#[derive(Debug, Clone)]
struct Labels {
    streamed: String,
    polled: String,
}

/// Dashboard state shared by handlers, the broadcaster and the monitor.
#[derive(Clone)]
pub struct DashboardState {
    view: Arc<RwLock<MonitorView>>,
    log: Arc<RwLock<EventLog>>,
    thresholds: ThresholdHandle,
    health: Arc<FeedHealth>,
    labels: Arc<Labels>,
    broadcast_tx: broadcast::Sender<String>,
}

impl DashboardState {
    pub fn new(
        initial: MonitorView,
        thresholds: ThresholdHandle,
        health: Arc<FeedHealth>,
        config: &DashboardConfig,
    ) -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            view: Arc::new(RwLock::new(initial)),
            log: Arc::new(RwLock::new(EventLog::new())),
            thresholds,
            health,
            labels: Arc::new(Labels {
                streamed: config.streamed_label.clone(),
                polled: config.polled_label.clone(),
            }),
            broadcast_tx,
        }
    }

    pub fn thresholds(&self) -> &ThresholdHandle {
        &self.thresholds
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.broadcast_tx.subscribe()
    }

    pub fn log_len(&self) -> usize {
        self.log.read().len()
    }

    fn cards(&self, view: &MonitorView) -> (PriceCard, PriceCard) {
        let now = Utc::now();
        (
            PriceCard::new(
                PriceSource::Streamed,
                &self.labels.streamed,
                view.streamed_price,
                self.health.snapshot_at(PriceSource::Streamed, now),
            ),
            PriceCard::new(
                PriceSource::Polled,
                &self.labels.polled,
                view.reference_price,
                self.health.snapshot_at(PriceSource::Polled, now),
            ),
        )
    }

    /// Collect a complete snapshot including the first log page.
    pub fn collect_snapshot(&self) -> DashboardSnapshot {
        let view = self.view.read().clone();
        let (streamed, polled) = self.cards(&view);
        let log = self.log.read();
        let first_page = log.page(1, cexdex_detector::DEFAULT_PAGE_SIZE);

        DashboardSnapshot {
            timestamp_ms: Utc::now().timestamp_millis(),
            streamed,
            polled,
            divergence: DivergenceSnapshot::new(view.abs_diff_pct, view.direction, view.armed),
            thresholds: self.thresholds.current(),
            log_total: log.len(),
            log: first_page.entries.iter().map(LogEntryView::from).collect(),
        }
    }

    /// Current values without the log.
    pub fn collect_update(&self) -> DashboardMessage {
        let view = self.view.read().clone();
        let (streamed, polled) = self.cards(&view);
        DashboardMessage::Update {
            timestamp_ms: Utc::now().timestamp_millis(),
            streamed,
            polled,
            divergence: DivergenceSnapshot::new(view.abs_diff_pct, view.direction, view.armed),
            thresholds: self.thresholds.current(),
            log_total: self.log.read().len(),
        }
    }

    pub fn log_page(&self, page: usize, page_size: usize) -> LogPageView {
        self.log.read().page(page, page_size).into()
    }

    /// Serialize and send to every connected client.
    pub fn broadcast(&self, msg: &DashboardMessage) {
        match serde_json::to_string(msg) {
            Ok(json) => match self.broadcast_tx.send(json) {
                Ok(n) => trace!(receivers = n, "Broadcast sent"),
                Err(_) => trace!("No WebSocket receivers connected"),
            },
            Err(e) => debug!(error = %e, "Failed to serialize dashboard message"),
        }
    }

    fn record_entry(&self, entry: &LogEntry) {
        self.log.write().push(entry.clone());
        self.broadcast(&DashboardMessage::LogEntry(LogEntryView::from(entry)));
    }
}

impl MonitorObserver for DashboardState {
    fn on_change(&self, change: &MonitorChange<'_>) {
        *self.view.write() = change.view.clone();
        if let Some(entry) = change.entry {
            self.record_entry(entry);
        }
        self.broadcast(&self.collect_update());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cexdex_core::ThresholdConfig;
    use cexdex_detector::{DivergenceMonitor, MonitorConfig};

    fn setup() -> (DivergenceMonitor, DashboardState) {
        let monitor = DivergenceMonitor::new(MonitorConfig {
            initial_armed: false,
            first_sequence: 1,
        });
        let state = DashboardState::new(
            monitor.view(),
            ThresholdHandle::default(),
            Arc::new(FeedHealth::default()),
            &DashboardConfig::default(),
        );
        (monitor, state)
    }

    #[test]
    fn test_initial_snapshot() {
        let (_, state) = setup();
        let snap = state.collect_snapshot();
        assert_eq!(snap.streamed.label, "Binance (BTC/USD)");
        assert_eq!(snap.polled.label, "Aerodrome (cbBTC/USDC)");
        assert!(snap.streamed.price.is_none());
        assert!(snap.streamed.health.status.is_stale());
        assert_eq!(snap.divergence.color, "#000000");
        assert_eq!(snap.thresholds, ThresholdConfig::default());
        assert_eq!(snap.log_total, 0);
    }

    #[test]
    fn test_mirrors_monitor() {
        let (mut monitor, state) = setup();
        monitor.subscribe(Arc::new(state.clone()));
        let mut rx = state.subscribe();

        let t = state.thresholds().current();
        monitor.on_reference_price(100.0);
        monitor.on_streamed_price(102.5, &t);

        let snap = state.collect_snapshot();
        assert_eq!(snap.streamed.price_label.as_deref(), Some("102.50"));
        assert_eq!(snap.polled.price_label.as_deref(), Some("100.00"));
        assert_eq!(snap.divergence.label.as_deref(), Some("2.44%"));
        assert_eq!(snap.divergence.arrow, "▲");
        assert_eq!(snap.log_total, 1);
        assert_eq!(snap.log[0].difference, "2.44%");

        // reference update, tick update, then log entry followed by update
        let mut types = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let v: serde_json::Value = serde_json::from_str(&msg).unwrap();
            types.push(v["type"].as_str().unwrap().to_string());
        }
        assert_eq!(types, vec!["update", "log_entry", "update"]);
    }
}
