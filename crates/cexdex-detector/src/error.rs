//! Detector error types.

use cexdex_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("Threshold rejected: {0}")]
    Threshold(#[from] CoreError),
}

pub type DetectorResult<T> = Result<T, DetectorError>;
