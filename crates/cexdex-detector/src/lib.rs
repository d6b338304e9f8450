//! Divergence detection between the streamed and polled prices.
//!
//! [`DivergenceMonitor`] owns the latch and the event log and is driven by
//! the application's event loop. Thresholds are read from a
//! [`ThresholdHandle`] at evaluation time; state changes are pushed to
//! [`MonitorObserver`]s.

pub mod error;
pub mod event_log;
pub mod monitor;
pub mod observer;
pub mod thresholds;

pub use error::{DetectorError, DetectorResult};
pub use event_log::{EventLog, LogPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use monitor::{DivergenceMonitor, MonitorConfig, MonitorView};
pub use observer::{ChangeCause, MonitorChange, MonitorObserver};
pub use thresholds::ThresholdHandle;
