//! Delivery error types.

use revflow_scheduler::JobError;
use thiserror::Error;

/// Delivery error type.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("server returned status {0}")]
    Status(u16),

    /// Payload serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using DeliveryError.
pub type DeliveryResult<T> = Result<T, DeliveryError>;

impl From<DeliveryError> for JobError {
    fn from(error: DeliveryError) -> Self {
        match error {
            DeliveryError::Status(status) => JobError::HttpStatus(status),
            DeliveryError::Http(e) => JobError::Transport(e.to_string()),
            DeliveryError::Json(e) => JobError::Message(e.to_string()),
        }
    }
}
