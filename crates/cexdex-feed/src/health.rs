//! Per-source feed health.
//!
//! A source is live after a successful update and goes stale either on a
//! failure or when no update arrived within `stale_after_ms`.

use cexdex_core::PriceSource;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Default staleness limit. Three missed polls.
pub const DEFAULT_STALE_AFTER_MS: i64 = 30_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SourceStatus {
    Live,
    Stale { reason: String },
}

impl SourceStatus {
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Snapshot of one source's health.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHealth {
    pub status: SourceStatus,
    pub last_update: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub error_count: u64,
}

impl Default for SourceHealth {
    fn default() -> Self {
        Self {
            status: SourceStatus::Stale {
                reason: "no data yet".to_string(),
            },
            last_update: None,
            last_error: None,
            error_count: 0,
        }
    }
}

/// Health of both feed sides. Shared between the event loop and readers.
#[derive(Debug)]
pub struct FeedHealth {
    stale_after_ms: i64,
    streamed: RwLock<SourceHealth>,
    polled: RwLock<SourceHealth>,
}

impl Default for FeedHealth {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_AFTER_MS)
    }
}

impl FeedHealth {
    pub fn new(stale_after_ms: i64) -> Self {
        Self {
            stale_after_ms,
            streamed: RwLock::new(SourceHealth::default()),
            polled: RwLock::new(SourceHealth::default()),
        }
    }

    fn slot(&self, source: PriceSource) -> &RwLock<SourceHealth> {
        match source {
            PriceSource::Streamed => &self.streamed,
            PriceSource::Polled => &self.polled,
        }
    }

    pub fn record_success(&self, source: PriceSource) {
        self.record_success_at(source, Utc::now());
    }

    pub fn record_success_at(&self, source: PriceSource, at: DateTime<Utc>) {
        let mut slot = self.slot(source).write();
        slot.status = SourceStatus::Live;
        slot.last_update = Some(at);
    }

    pub fn record_failure(&self, source: PriceSource, reason: impl Into<String>) {
        let reason = reason.into();
        let mut slot = self.slot(source).write();
        slot.error_count += 1;
        slot.last_error = Some(reason.clone());
        slot.status = SourceStatus::Stale { reason };
    }

    /// Current health, with the age limit applied.
    pub fn snapshot(&self, source: PriceSource) -> SourceHealth {
        self.snapshot_at(source, Utc::now())
    }

    pub fn snapshot_at(&self, source: PriceSource, now: DateTime<Utc>) -> SourceHealth {
        let mut health = self.slot(source).read().clone();
        if let (SourceStatus::Live, Some(last)) = (&health.status, health.last_update) {
            let age_ms = (now - last).num_milliseconds();
            if age_ms > self.stale_after_ms {
                health.status = SourceStatus::Stale {
                    reason: format!("no update for {age_ms}ms"),
                };
            }
        }
        health
    }

    pub fn is_stale(&self, source: PriceSource) -> bool {
        self.snapshot(source).status.is_stale()
    }
}
