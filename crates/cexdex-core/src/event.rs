//! Threshold-crossing events and the divergence direction indicator.

use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which edge of the threshold band was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// `abs_diff >= max_diff` while the latch was clear.
    AboveMaximum,
    /// `abs_diff < min_diff` while the latch was set.
    UnderMinimum,
}

impl EventKind {
    /// Human-readable label shown in the event log.
    pub fn label(self) -> &'static str {
        match self {
            Self::AboveMaximum => "Difference above maximum threshold",
            Self::UnderMinimum => "Difference under minimum threshold",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AboveMaximum => "above_maximum",
            Self::UnderMinimum => "under_minimum",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Direction of the streamed price relative to the reference price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Streamed price above reference.
    Up,
    /// Streamed price below reference.
    Down,
    /// No comparison made yet.
    #[default]
    Flat,
}

impl Direction {
    /// Display colour for the divergence indicator.
    pub fn color(self) -> &'static str {
        match self {
            Self::Up => "#3f8600",
            Self::Down => "#cf1322",
            Self::Flat => "#000000",
        }
    }
}

/// One row of the event log. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Monotonic sequence number.
    pub sequence: u64,
    /// Streamed price that triggered the check.
    pub streamed_price: f64,
    /// Reference price at emission, 2 dp.
    pub polled_price: Decimal,
    /// Absolute divergence percent, 2 dp.
    pub difference_pct: Decimal,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    /// Difference with percent suffix, e.g. `2.44%`.
    pub fn difference_label(&self) -> String {
        format!("{:.2}%", self.difference_pct)
    }

    /// Reference price with exactly two decimals.
    pub fn polled_label(&self) -> String {
        format!("{:.2}", self.polled_price)
    }

    /// Local wall-clock time without offset, e.g. `2024-11-02 14:03:11`.
    pub fn timestamp_label(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry() -> LogEntry {
        LogEntry {
            sequence: 7,
            streamed_price: 102.5,
            polled_price: dec!(100),
            difference_pct: dec!(2.44),
            event: EventKind::AboveMaximum,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_labels_pad_to_two_decimals() {
        let e = entry();
        assert_eq!(e.polled_label(), "100.00");
        assert_eq!(e.difference_label(), "2.44%");
        assert_eq!(e.event.to_string(), "Difference above maximum threshold");
    }

    #[test]
    fn test_timestamp_label_has_no_offset() {
        let label = entry().timestamp_label();
        assert_eq!(label.len(), 19);
        assert!(!label.contains('T'));
        assert!(!label.contains('+'));
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_string(&entry()).unwrap();
        assert!(json.contains("\"event\":\"above_maximum\""));
        assert!(json.contains("\"difference_pct\":\"2.44\""));
    }

    #[test]
    fn test_direction_colors() {
        assert_eq!(Direction::default(), Direction::Flat);
        assert_eq!(Direction::Up.color(), "#3f8600");
        assert_eq!(Direction::Down.color(), "#cf1322");
    }
}
