//! Prometheus metrics and structured logging for the divergence monitor.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus metrics for prices, divergence, latch and feed health
//! - A monitor observer that mirrors state into the metrics

pub mod error;
pub mod logging;
pub mod metrics;
pub mod observer;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging_with;
pub use metrics::{encode_metrics, Metrics};
pub use observer::MetricsObserver;
