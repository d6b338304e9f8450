//! Change notification seam between the monitor and its readers.

use crate::monitor::MonitorView;
use cexdex_core::LogEntry;

/// What prompted a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeCause {
    StreamedTick,
    ReferenceUpdate,
}

/// State after one handler invocation.
#[derive(Debug, Clone)]
pub struct MonitorChange<'a> {
    pub cause: ChangeCause,
    pub view: MonitorView,
    /// Entry emitted by this invocation, if any.
    pub entry: Option<&'a LogEntry>,
}

/// Receives monitor state after every streamed tick and reference update.
///
/// Called synchronously from the event loop, so implementations must not
/// block.
pub trait MonitorObserver: Send + Sync {
    fn on_change(&self, change: &MonitorChange<'_>);
}
