//! Dashboard API types.
//!
//! These types are used for JSON serialization in REST and WebSocket APIs.

use cexdex_core::{round_cents, Direction, EventKind, LogEntry, PriceSource, ThresholdConfig};
use cexdex_detector::LogPage;
use cexdex_feed::SourceHealth;
use serde::{Deserialize, Serialize};

/// One price card.
#[derive(Debug, Clone, Serialize)]
pub struct PriceCard {
    pub source: PriceSource,
    /// Display label, e.g. "Binance (BTC/USD)".
    pub label: String,
    pub price: Option<f64>,
    /// Price with two decimals.
    pub price_label: Option<String>,
    pub health: SourceHealth,
}

impl PriceCard {
    pub fn new(source: PriceSource, label: &str, price: Option<f64>, health: SourceHealth) -> Self {
        Self {
            source,
            label: label.to_string(),
            price,
            price_label: price.and_then(round_cents).map(|d| format!("{d:.2}")),
            health,
        }
    }
}

/// Divergence indicator.
#[derive(Debug, Clone, Serialize)]
pub struct DivergenceSnapshot {
    pub abs_diff_pct: Option<f64>,
    /// Difference with percent suffix, e.g. "2.44%".
    pub label: Option<String>,
    pub direction: Direction,
    /// "▲", "▼" or empty before the first comparison.
    pub arrow: &'static str,
    pub color: &'static str,
    pub armed: bool,
}

impl DivergenceSnapshot {
    pub fn new(abs_diff_pct: Option<f64>, direction: Direction, armed: bool) -> Self {
        Self {
            abs_diff_pct,
            label: abs_diff_pct
                .and_then(round_cents)
                .map(|d| format!("{d:.2}%")),
            direction,
            arrow: match direction {
                Direction::Up => "▲",
                Direction::Down => "▼",
                Direction::Flat => "",
            },
            color: direction.color(),
            armed,
        }
    }
}

/// One log row as displayed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntryView {
    pub sequence: u64,
    pub streamed_price: f64,
    /// Reference price, two decimals.
    pub polled_price: String,
    /// Difference with percent suffix.
    pub difference: String,
    pub event: EventKind,
    /// Event label, e.g. "Difference above maximum threshold".
    pub event_label: &'static str,
    /// Local wall-clock time.
    pub timestamp: String,
    pub timestamp_ms: i64,
}

impl From<&LogEntry> for LogEntryView {
    fn from(entry: &LogEntry) -> Self {
        Self {
            sequence: entry.sequence,
            streamed_price: entry.streamed_price,
            polled_price: entry.polled_label(),
            difference: entry.difference_label(),
            event: entry.event,
            event_label: entry.event.label(),
            timestamp: entry.timestamp_label(),
            timestamp_ms: entry.timestamp.timestamp_millis(),
        }
    }
}

/// Full dashboard state snapshot (sent on initial connection and via REST).
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Timestamp when snapshot was taken (Unix milliseconds).
    pub timestamp_ms: i64,
    pub streamed: PriceCard,
    pub polled: PriceCard,
    pub divergence: DivergenceSnapshot,
    pub thresholds: ThresholdConfig,
    /// Total log entries.
    pub log_total: usize,
    /// First log page (newest first).
    pub log: Vec<LogEntryView>,
}

/// WebSocket message types.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardMessage {
    /// Full state, sent once on connect.
    Snapshot(DashboardSnapshot),
    /// Current values without the log.
    Update {
        timestamp_ms: i64,
        streamed: PriceCard,
        polled: PriceCard,
        divergence: DivergenceSnapshot,
        thresholds: ThresholdConfig,
        log_total: usize,
    },
    /// Newly emitted log entry.
    LogEntry(LogEntryView),
}

/// Query parameters for `/api/log`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

/// One page of the log as displayed.
#[derive(Debug, Clone, Serialize)]
pub struct LogPageView {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub entries: Vec<LogEntryView>,
}

impl From<LogPage> for LogPageView {
    fn from(page: LogPage) -> Self {
        Self {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
            entries: page.entries.iter().map(LogEntryView::from).collect(),
        }
    }
}

/// Error body for rejected requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    #[test]
    fn test_divergence_labels() {
        let up = DivergenceSnapshot::new(Some(2.439024), Direction::Up, true);
        assert_eq!(up.label.as_deref(), Some("2.44%"));
        assert_eq!(up.arrow, "▲");
        assert_eq!(up.color, "#3f8600");

        let initial = DivergenceSnapshot::new(None, Direction::Flat, true);
        assert!(initial.label.is_none());
        assert_eq!(initial.color, "#000000");
    }

    #[test]
    fn test_price_card_label() {
        let card = PriceCard::new(
            PriceSource::Polled,
            "Aerodrome (cbBTC/USDC)",
            Some(100.0),
            SourceHealth::default(),
        );
        assert_eq!(card.price_label.as_deref(), Some("100.00"));
    }

    #[test]
    fn test_log_entry_view() {
        let entry = LogEntry {
            sequence: 3,
            streamed_price: 102.5,
            polled_price: dec!(100.00),
            difference_pct: dec!(2.44),
            event: EventKind::AboveMaximum,
            timestamp: Utc::now(),
        };
        let view = LogEntryView::from(&entry);
        assert_eq!(view.polled_price, "100.00");
        assert_eq!(view.difference, "2.44%");
        assert_eq!(view.event_label, "Difference above maximum threshold");
    }

    #[test]
    fn test_message_tagging() {
        let entry = LogEntry {
            sequence: 1,
            streamed_price: 101.0,
            polled_price: dec!(100),
            difference_pct: dec!(0.99),
            event: EventKind::UnderMinimum,
            timestamp: Utc::now(),
        };
        let msg = DashboardMessage::LogEntry(LogEntryView::from(&entry));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "log_entry");
        assert_eq!(json["event"], "under_minimum");
        assert_eq!(json["difference"], "0.99%");
    }
}
