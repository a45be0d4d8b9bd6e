//! Store error types.

use thiserror::Error;

/// Errors that can occur when talking to a dataset source or progress store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The endpoint returned an error status.
    #[error("HTTP error ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The endpoint answered with a body we could not understand.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// A configured URL could not be parsed.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl StoreError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64) -> Self {
        if e.is_timeout() {
            StoreError::Timeout(timeout_secs)
        } else {
            StoreError::NetworkError(e.to_string())
        }
    }
}
