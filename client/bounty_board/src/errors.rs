//! Crate-wide error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Malformed object data: {0}")]
    MalformedData(String),

    /// One item of a collection fetch failed; no partial list is returned.
    #[error("Collection fetch failed at item {index}: {source}")]
    AggregateFailure {
        index: usize,
        #[source]
        source: Box<BoardError>,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl BoardError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedData(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, BoardError>;
