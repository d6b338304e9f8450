//! Core domain types for the CEX/DEX divergence monitor.
//!
//! This crate provides the types shared by every other crate:
//! - `PriceSource`, `round_cents`: feed sides and 2 dp rounding
//! - `ThresholdConfig`, `ThresholdUpdate`: the divergence band
//! - `LogEntry`, `EventKind`, `Direction`: threshold-crossing records

pub mod error;
pub mod event;
pub mod price;
pub mod threshold;

pub use error::{CoreError, Result};
pub use event::{Direction, EventKind, LogEntry};
pub use price::{round_cents, PriceSource};
pub use threshold::{parse_percent, ThresholdConfig, ThresholdUpdate};
