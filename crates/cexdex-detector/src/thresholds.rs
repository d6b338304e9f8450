//! Shared threshold handle.
//!
//! Writers (the dashboard) validate and publish; the event loop reads the
//! latest valid band at evaluation time.

use crate::error::DetectorResult;
use cexdex_core::{CoreError, ThresholdConfig, ThresholdUpdate};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ThresholdHandle {
    tx: Arc<watch::Sender<ThresholdConfig>>,
}

impl ThresholdHandle {
    pub fn new(initial: ThresholdConfig) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Latest valid thresholds.
    pub fn current(&self) -> ThresholdConfig {
        *self.tx.borrow()
    }

    /// Validate and apply a partial update atomically.
    ///
    /// On error nothing changes and the last valid thresholds are kept.
    pub fn apply(&self, update: &ThresholdUpdate) -> DetectorResult<ThresholdConfig> {
        let mut outcome: Result<ThresholdConfig, CoreError> = Ok(self.current());
        self.tx.send_if_modified(|current| match current.apply(update) {
            Ok(next) => {
                let changed = next != *current;
                *current = next;
                outcome = Ok(next);
                changed
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });

        match outcome {
            Ok(next) => {
                info!(min_diff = next.min_diff, max_diff = next.max_diff, "Thresholds updated");
                Ok(next)
            }
            Err(e) => {
                warn!(error = %e, "Threshold update rejected");
                Err(e.into())
            }
        }
    }
}

impl Default for ThresholdHandle {
    fn default() -> Self {
        Self::new(ThresholdConfig::default())
    }
}
