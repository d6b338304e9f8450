//! Prometheus metrics for the divergence monitor.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A failure means a
//! duplicate metric name, which is a startup bug. These panics only occur
//! during static initialization, never at runtime.

use crate::error::TelemetryResult;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_gauge, register_gauge_vec, CounterVec, Encoder, Gauge,
    GaugeVec, TextEncoder,
};

/// WebSocket connection state (1 = connected, 0 = disconnected).
pub static WS_CONNECTED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "cexdex_ws_connected",
        "Trade stream connection state (1=connected)"
    )
    .unwrap()
});

/// Latest price per source.
/// Labels: source (streamed/polled)
pub static PRICE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!("cexdex_price", "Latest price per source", &["source"]).unwrap()
});

/// Absolute divergence in percent.
pub static DIVERGENCE_PCT: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "cexdex_divergence_pct",
        "Absolute streamed/polled divergence in percent"
    )
    .unwrap()
});

/// Latch state (1 = armed).
pub static LATCH_ARMED: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("cexdex_latch_armed", "Divergence latch state (1=armed)").unwrap()
});

/// Current threshold values.
/// Labels: bound (min/max)
pub static THRESHOLD_PCT: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "cexdex_threshold_pct",
        "Configured divergence thresholds in percent",
        &["bound"]
    )
    .unwrap()
});

/// Threshold crossings logged.
/// Labels: event (above_maximum/under_minimum)
pub static THRESHOLD_EVENTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cexdex_threshold_events_total",
        "Total threshold crossing events logged",
        &["event"]
    )
    .unwrap()
});

/// Feed errors.
/// Labels: source, kind (parse/unavailable)
pub static FEED_ERRORS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "cexdex_feed_errors_total",
        "Total feed errors by source and kind",
        &["source", "kind"]
    )
    .unwrap()
});

/// Feed staleness (1 = stale).
/// Labels: source
pub static FEED_STALE: Lazy<GaugeVec> = Lazy::new(|| {
    register_gauge_vec!(
        "cexdex_feed_stale",
        "Feed staleness per source (1=stale)",
        &["source"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    pub fn ws_connected() {
        WS_CONNECTED.set(1.0);
    }

    pub fn ws_disconnected() {
        WS_CONNECTED.set(0.0);
    }

    pub fn price(source: &str, price: f64) {
        PRICE.with_label_values(&[source]).set(price);
    }

    pub fn divergence(abs_diff_pct: f64) {
        DIVERGENCE_PCT.set(abs_diff_pct);
    }

    pub fn latch(armed: bool) {
        LATCH_ARMED.set(if armed { 1.0 } else { 0.0 });
    }

    pub fn thresholds(min_diff: f64, max_diff: f64) {
        THRESHOLD_PCT.with_label_values(&["min"]).set(min_diff);
        THRESHOLD_PCT.with_label_values(&["max"]).set(max_diff);
    }

    pub fn threshold_event(event: &str) {
        THRESHOLD_EVENTS_TOTAL.with_label_values(&[event]).inc();
    }

    pub fn feed_error(source: &str, kind: &str) {
        FEED_ERRORS_TOTAL.with_label_values(&[source, kind]).inc();
    }

    pub fn feed_stale(source: &str, stale: bool) {
        FEED_STALE
            .with_label_values(&[source])
            .set(if stale { 1.0 } else { 0.0 });
    }
}

/// Render the default registry in the Prometheus text format.
pub fn encode_metrics() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let mut buf = Vec::new();
    encoder.encode(&prometheus::gather(), &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_contains_recorded_metrics() {
        Metrics::thresholds(1.25, 2.5);
        Metrics::feed_error("polled", "unavailable");

        let text = encode_metrics().unwrap();
        assert!(text.contains(r#"cexdex_threshold_pct{bound="min"} 1.25"#));
        assert!(text.contains(r#"cexdex_threshold_pct{bound="max"} 2.5"#));
        assert!(text.contains("# TYPE cexdex_feed_errors_total counter"));
    }
}
