//! Feed error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedError {
    /// Payload arrived but could not be turned into a price.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Source could not be reached or answered with a failure status.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

impl FeedError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

pub type FeedResult<T> = Result<T, FeedError>;
