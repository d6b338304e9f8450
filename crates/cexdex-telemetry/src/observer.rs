//! Mirrors monitor state into the Prometheus metrics.

use crate::metrics::Metrics;
use cexdex_core::PriceSource;
use cexdex_detector::{MonitorChange, MonitorObserver};

#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl MonitorObserver for MetricsObserver {
    fn on_change(&self, change: &MonitorChange<'_>) {
        let view = &change.view;
        if let Some(price) = view.streamed_price {
            Metrics::price(PriceSource::Streamed.as_str(), price);
        }
        if let Some(price) = view.reference_price {
            Metrics::price(PriceSource::Polled.as_str(), price);
        }
        if let Some(diff) = view.abs_diff_pct {
            Metrics::divergence(diff);
        }
        Metrics::latch(view.armed);

        if let Some(entry) = change.entry {
            Metrics::threshold_event(entry.event.as_str());
        }
    }
}
