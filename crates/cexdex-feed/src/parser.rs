//! Trade stream parsing.
//!
//! Turns raw frames from the exchange trade stream into prices. Frames for
//! other event types or other symbols are skipped; malformed frames are
//! rejected with [`FeedError::Parse`] and never reach the monitor.

use crate::error::{FeedError, FeedResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

/// Counters for parsed and rejected frames.
#[derive(Debug, Default)]
pub struct ParseStats {
    pub accepted_count: AtomicU64,
    pub skipped_count: AtomicU64,
    pub rejected_count: AtomicU64,
}

impl ParseStats {
    pub fn accepted(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }
}

/// Raw trade event.
/// Format: {"e":"trade","E":..,"s":"BTCUSDC","t":..,"p":"67000.01","q":"0.01","T":..}
#[derive(Debug, Deserialize)]
struct RawTrade {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "s", default)]
    symbol: Option<String>,
    #[serde(rename = "p", default)]
    price: Option<String>,
    #[serde(rename = "T", default)]
    trade_time_ms: Option<i64>,
}

/// A trade price extracted from the stream.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamedTrade {
    pub symbol: Option<String>,
    /// Trade price rounded to 2 dp.
    pub price: f64,
    pub trade_time_ms: Option<i64>,
}

/// Parser for trade stream frames.
#[derive(Debug, Default)]
pub struct TradeParser {
    /// Only trades for this symbol are accepted (case-insensitive).
    symbol: Option<String>,
    stats: ParseStats,
}

impl TradeParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict accepted trades to `symbol` (e.g. "btcusdc").
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            symbol: Some(symbol.into()),
            stats: ParseStats::default(),
        }
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Parse one frame.
    ///
    /// Returns `Ok(None)` for frames that are valid but not a trade for the
    /// configured symbol.
    pub fn parse(&self, text: &str) -> FeedResult<Option<StreamedTrade>> {
        match self.parse_inner(text) {
            Ok(Some(trade)) => {
                self.stats.accepted_count.fetch_add(1, Ordering::Relaxed);
                Ok(Some(trade))
            }
            Ok(None) => {
                self.stats.skipped_count.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
            Err(e) => {
                self.stats.rejected_count.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn parse_inner(&self, text: &str) -> FeedResult<Option<StreamedTrade>> {
        let raw: RawTrade = serde_json::from_str(text)?;

        if raw.event_type != "trade" {
            trace!(event_type = %raw.event_type, "Skipping non-trade event");
            return Ok(None);
        }

        if let (Some(expected), Some(actual)) = (&self.symbol, &raw.symbol) {
            if !expected.eq_ignore_ascii_case(actual) {
                debug!(%expected, %actual, "Skipping trade for other symbol");
                return Ok(None);
            }
        }

        let price_str = raw
            .price
            .ok_or_else(|| FeedError::Parse("trade without price field".to_string()))?;
        let price = parse_price(&price_str)?;

        Ok(Some(StreamedTrade {
            symbol: raw.symbol,
            price,
            trade_time_ms: raw.trade_time_ms,
        }))
    }
}

/// Parse a decimal price string, rounded half away from zero to 2 dp.
///
/// Non-positive prices are rejected.
pub(crate) fn parse_price(s: &str) -> FeedResult<f64> {
    let value = Decimal::from_str(s.trim())
        .map_err(|e| FeedError::Parse(format!("invalid price '{s}': {e}")))?;
    if value <= Decimal::ZERO {
        return Err(FeedError::Parse(format!("non-positive price '{s}'")));
    }
    value
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .ok_or_else(|| FeedError::Parse(format!("price '{s}' out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRADE: &str = r#"{"e":"trade","E":1700000000001,"s":"BTCUSDC","t":12345,"p":"67012.345","q":"0.015","T":1700000000000,"m":true,"M":true}"#;

    #[test]
    fn test_parse_trade() {
        let parser = TradeParser::new();
        let trade = parser.parse(TRADE).unwrap().unwrap();
        assert_eq!(trade.price, 67012.35);
        assert_eq!(trade.symbol.as_deref(), Some("BTCUSDC"));
        assert_eq!(trade.trade_time_ms, Some(1700000000000));
        assert_eq!(parser.stats().accepted(), 1);
    }

    #[test]
    fn test_non_trade_event_skipped() {
        let parser = TradeParser::new();
        let frame = r#"{"e":"aggTrade","s":"BTCUSDC","p":"1.00"}"#;
        assert!(parser.parse(frame).unwrap().is_none());
        assert_eq!(parser.stats().skipped(), 1);
    }

    #[test]
    fn test_symbol_filter() {
        let parser = TradeParser::for_symbol("btcusdc");
        assert!(parser.parse(TRADE).unwrap().is_some());

        let other = r#"{"e":"trade","s":"ETHUSDC","p":"3000.00"}"#;
        assert!(parser.parse(other).unwrap().is_none());
    }

    #[test]
    fn test_malformed_frames_rejected() {
        let parser = TradeParser::new();
        for frame in [
            "not json",
            r#"{"s":"BTCUSDC","p":"1.00"}"#,
            r#"{"e":"trade","s":"BTCUSDC"}"#,
            r#"{"e":"trade","s":"BTCUSDC","p":"abc"}"#,
            r#"{"e":"trade","s":"BTCUSDC","p":"0"}"#,
            r#"{"e":"trade","s":"BTCUSDC","p":"-5.00"}"#,
        ] {
            let err = parser.parse(frame).unwrap_err();
            assert!(err.is_parse(), "expected parse error for {frame}");
        }
        assert_eq!(parser.stats().rejected(), 6);
        assert_eq!(parser.stats().accepted(), 0);
    }

    #[test]
    fn test_parse_price_rounding() {
        assert_eq!(parse_price("100.005").unwrap(), 100.01);
        assert_eq!(parse_price("99.994").unwrap(), 99.99);
        assert_eq!(parse_price(" 42 ").unwrap(), 42.0);
    }
}
