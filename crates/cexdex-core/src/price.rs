//! Price sources and display rounding.
//!
//! Prices stay `f64` on the hot path; `round_cents` converts to an exact
//! two-decimal `Decimal` for anything displayed or recorded.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the comparison a price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Centralized exchange trade stream (push).
    Streamed,
    /// Decentralized exchange pool API (poll).
    Polled,
}

impl PriceSource {
    pub const ALL: [PriceSource; 2] = [PriceSource::Streamed, PriceSource::Polled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Streamed => "streamed",
            Self::Polled => "polled",
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Round a float to 2 decimal places (half away from zero).
///
/// Returns `None` for NaN, infinities and values outside `Decimal` range.
pub fn round_cents(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_f64(value)
        .map(|d| d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
