//! Divergence threshold band.
//!
//! `min_diff <= max_diff` is expected but deliberately not enforced; an
//! inverted band simply changes which ticks fire.

use crate::error::{CoreError, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

/// Default lower threshold in percent.
pub const DEFAULT_MIN_DIFF: f64 = 1.0;
/// Default upper threshold in percent.
pub const DEFAULT_MAX_DIFF: f64 = 2.0;

/// Percent thresholds for the hysteresis band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// "Under minimum" fires when `abs_diff < min_diff`.
    #[serde(default = "default_min_diff")]
    pub min_diff: f64,
    /// "Above maximum" fires when `abs_diff >= max_diff`.
    #[serde(default = "default_max_diff")]
    pub max_diff: f64,
}

fn default_min_diff() -> f64 {
    DEFAULT_MIN_DIFF
}

fn default_max_diff() -> f64 {
    DEFAULT_MAX_DIFF
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            min_diff: default_min_diff(),
            max_diff: default_max_diff(),
        }
    }
}

impl ThresholdConfig {
    /// Build a band from raw floats, normalizing both to 2 dp.
    pub fn new(min_diff: f64, max_diff: f64) -> Result<Self> {
        Ok(Self {
            min_diff: percent_from_f64("min_diff", min_diff)?,
            max_diff: percent_from_f64("max_diff", max_diff)?,
        })
    }

    /// Validate values loaded from a config file.
    pub fn validate(&self) -> Result<()> {
        percent_from_f64("min_diff", self.min_diff)?;
        percent_from_f64("max_diff", self.max_diff)?;
        Ok(())
    }

    /// Apply a partial update, returning the new band.
    ///
    /// If any supplied field is invalid the whole update is rejected and
    /// `self` is left as the last valid value.
    pub fn apply(&self, update: &ThresholdUpdate) -> Result<Self> {
        let min_diff = match &update.min_diff {
            Some(v) => percent_from_value("min_diff", v)?,
            None => self.min_diff,
        };
        let max_diff = match &update.max_diff {
            Some(v) => percent_from_value("max_diff", v)?,
            None => self.max_diff,
        };
        Ok(Self { min_diff, max_diff })
    }
}

/// Raw threshold input from the presentation layer.
///
/// Fields are JSON numbers or numeric strings; absent fields keep their
/// current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    #[serde(default)]
    pub min_diff: Option<Value>,
    #[serde(default)]
    pub max_diff: Option<Value>,
}

/// Parse a percent input such as `"1.5"` or `"1.5%"`.
///
/// Rejects non-numeric and negative input; rounds to 2 dp.
pub fn parse_percent(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let value = Decimal::from_str(trimmed)
        .map_err(|e| CoreError::ConfigInvalid(format!("'{input}' is not a number: {e}")))?;
    normalize("percent", value)
}

fn percent_from_value(field: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => {
            let f = n.as_f64().ok_or_else(|| {
                CoreError::ConfigInvalid(format!("{field}: {n} is not representable"))
            })?;
            percent_from_f64(field, f)
        }
        Value::String(s) => parse_percent(s)
            .map_err(|e| CoreError::ConfigInvalid(format!("{field}: {e}"))),
        other => Err(CoreError::ConfigInvalid(format!(
            "{field}: expected a number, got {other}"
        ))),
    }
}

fn percent_from_f64(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(CoreError::ConfigInvalid(format!(
            "{field}: {value} is not a finite number"
        )));
    }
    let decimal = Decimal::from_f64(value)
        .ok_or_else(|| CoreError::ConfigInvalid(format!("{field}: {value} is out of range")))?;
    normalize(field, decimal)
}

fn normalize(field: &str, value: Decimal) -> Result<f64> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(CoreError::ConfigInvalid(format!(
            "{field}: {value} must be non-negative"
        )));
    }
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| CoreError::ConfigInvalid(format!("{field}: {value} is out of range")))
}
