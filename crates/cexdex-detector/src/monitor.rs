//! Divergence monitor.
//!
//! Holds the latch, the reference price and the event log. Every streamed
//! price is compared against the reference:
//!
//! ```text
//! diff_pct = (current - reference) * 100 / current
//! abs_diff = |diff_pct|
//!
//! abs_diff >= max_diff && !armed  => "above maximum", armed = true
//! abs_diff <  min_diff &&  armed  => "under minimum", armed = false
//! otherwise                       => nothing
//! ```
//!
//! Reference updates replace the reference only and never evaluate.

use crate::event_log::EventLog;
use crate::observer::{ChangeCause, MonitorChange, MonitorObserver};
use cexdex_core::{round_cents, Direction, EventKind, LogEntry, ThresholdConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Initial monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Starting latch value. With `true` the first event can only be
    /// "under minimum".
    #[serde(default = "default_initial_armed")]
    pub initial_armed: bool,
    /// Sequence number of the first log entry.
    #[serde(default = "default_first_sequence")]
    pub first_sequence: u64,
}

fn default_initial_armed() -> bool {
    true
}

fn default_first_sequence() -> u64 {
    1
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            initial_armed: default_initial_armed(),
            first_sequence: default_first_sequence(),
        }
    }
}

/// Observable monitor values.
///
/// Prices and the difference are `None` until known and finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorView {
    pub streamed_price: Option<f64>,
    pub reference_price: Option<f64>,
    pub abs_diff_pct: Option<f64>,
    pub direction: Direction,
    pub color: String,
    pub armed: bool,
    pub log_len: usize,
    pub next_sequence: u64,
}

/// Latched divergence state machine.
pub struct DivergenceMonitor {
    armed: bool,
    /// NaN until the first poll succeeds.
    reference_price: f64,
    streamed_price: Option<f64>,
    abs_diff: Option<f64>,
    direction: Direction,
    next_sequence: u64,
    log: EventLog,
    observers: Vec<Arc<dyn MonitorObserver>>,
}

impl Default for DivergenceMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl DivergenceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            armed: config.initial_armed,
            reference_price: f64::NAN,
            streamed_price: None,
            abs_diff: None,
            direction: Direction::Flat,
            next_sequence: config.first_sequence,
            log: EventLog::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Arc<dyn MonitorObserver>) {
        self.observers.push(observer);
    }

    pub fn armed(&self) -> bool {
        self.armed
    }

    pub fn reference_price(&self) -> f64 {
        self.reference_price
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn view(&self) -> MonitorView {
        MonitorView {
            streamed_price: self.streamed_price,
            reference_price: Some(self.reference_price).filter(|p| p.is_finite()),
            abs_diff_pct: self.abs_diff,
            direction: self.direction,
            color: self.direction.color().to_string(),
            armed: self.armed,
            log_len: self.log.len(),
            next_sequence: self.next_sequence,
        }
    }

    /// Replace the reference price. Never evaluates thresholds.
    pub fn on_reference_price(&mut self, price: f64) {
        debug!(price, "Reference price updated");
        self.reference_price = price;
        self.notify(ChangeCause::ReferenceUpdate, None);
    }

    /// Evaluate one streamed price against the current reference.
    ///
    /// Returns the emitted entry, if the tick crossed an edge of the band.
    pub fn on_streamed_price(
        &mut self,
        current: f64,
        thresholds: &ThresholdConfig,
    ) -> Option<LogEntry> {
        let reference = self.reference_price;
        let diff_pct = (current - reference) * 100.0 / current;
        let abs_diff = diff_pct.abs();

        // NaN compares false both ways and keeps the previous direction
        if current > reference {
            self.direction = Direction::Up;
        } else if current < reference {
            self.direction = Direction::Down;
        }

        self.streamed_price = Some(current);
        self.abs_diff = Some(abs_diff).filter(|d| d.is_finite());

        let entry = if reference.is_finite() && abs_diff.is_finite() {
            self.evaluate(current, reference, abs_diff, thresholds)
        } else {
            debug!(current, reference, "No crossing can be determined");
            None
        };

        self.notify(ChangeCause::StreamedTick, entry.as_ref());
        entry
    }

    fn evaluate(
        &mut self,
        current: f64,
        reference: f64,
        abs_diff: f64,
        thresholds: &ThresholdConfig,
    ) -> Option<LogEntry> {
        let event = if abs_diff >= thresholds.max_diff && !self.armed {
            EventKind::AboveMaximum
        } else if abs_diff < thresholds.min_diff && self.armed {
            EventKind::UnderMinimum
        } else {
            return None;
        };

        // Both inputs are finite here, so rounding cannot fail
        let polled_price = round_cents(reference)?;
        let difference_pct = round_cents(abs_diff)?;

        self.armed = matches!(event, EventKind::AboveMaximum);
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let entry = LogEntry {
            sequence,
            streamed_price: current,
            polled_price,
            difference_pct,
            event,
            timestamp: Utc::now(),
        };

        info!(
            sequence,
            event = event.as_str(),
            streamed = current,
            reference,
            abs_diff,
            min_diff = thresholds.min_diff,
            max_diff = thresholds.max_diff,
            "Threshold crossed"
        );

        self.log.push(entry.clone());
        Some(entry)
    }

    fn notify(&self, cause: ChangeCause, entry: Option<&LogEntry>) {
        if self.observers.is_empty() {
            return;
        }
        let change = MonitorChange {
            cause,
            view: self.view(),
            entry,
        };
        for observer in &self.observers {
            observer.on_change(&change);
        }
    }
}
