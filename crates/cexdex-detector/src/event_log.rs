//! Append-only threshold event log, newest first.

use cexdex_core::LogEntry;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// In-memory log of threshold crossings.
///
/// Entries are only ever prepended. Nothing is mutated or removed.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

/// One page of the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
    /// 1-based page number actually served.
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub entries: Vec<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Iterate newest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Fetch a page. `page` is 1-based; 0 is treated as 1. `page_size` is
    /// clamped to `1..=MAX_PAGE_SIZE`.
    pub fn page(&self, page: usize, page_size: usize) -> LogPage {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        let total = self.entries.len();
        let total_pages = total.div_ceil(page_size);

        let entries = self
            .entries
            .iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .cloned()
            .collect();

        LogPage {
            page,
            page_size,
            total,
            total_pages,
            entries,
        }
    }
}
