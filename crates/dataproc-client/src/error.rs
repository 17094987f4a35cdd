//! Dataproc client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Dataproc API
#[derive(Debug, Error)]
pub enum DataprocError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Dataproc API returned an error
    #[error("Dataproc API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Token exchange rejected or token unusable
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Service-account key file unreadable or malformed
    #[error("Invalid credentials: {0}")]
    Credentials(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request (e.g., empty cluster name)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DataprocError {
    /// Whether this error is the API's "not found" signal.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DataprocError::NotFound(_))
    }
}
