//! Error types for cexdex-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
