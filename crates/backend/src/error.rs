//! Errors returned by the gateway.

use thiserror::Error;

/// Errors that can occur when talking to the backend service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Backend returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// Response body did not match the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested row does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the service.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Credentials or tokens were rejected.
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// Object storage rejected the upload.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BackendError {
    /// Whether the failure was caused by bad credentials rather than the
    /// service itself.
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
