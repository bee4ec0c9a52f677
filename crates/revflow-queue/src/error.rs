//! Queue error types.

use thiserror::Error;

/// Queue error type, surfaced only by `size` and `clear_queue`.
#[derive(Error, Debug)]
pub enum QueueError {
    /// Storage-layer fault
    #[error("storage error: {0}")]
    Storage(#[from] revflow_storage::StorageError),
}

/// Result type alias using QueueError.
pub type QueueResult<T> = Result<T, QueueError>;

/// Failure returned by a consumer for a batch it could not accept.
///
/// The queue reacts identically to all variants — the batch stays in storage
/// and is retried on the next trigger — so the variants only carry intent.
#[derive(Error, Debug)]
pub enum ConsumeError {
    /// The batch could not be handed to the delivery runtime
    #[error("delivery scheduling failed: {0}")]
    Scheduling(String),

    /// Generic consumer failure
    #[error("{0}")]
    Other(String),
}
