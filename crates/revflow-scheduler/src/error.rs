//! Scheduler error types.

use thiserror::Error;

/// Failure produced by a job's `on_run`.
///
/// Network-shaped variants are first-class because delivery jobs are the
/// dominant consumer; anything else goes through `Message`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// The endpoint answered with a non-success status code
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// Transport-level network failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Any other job-defined failure
    #[error("{0}")]
    Message(String),
}

/// Scheduler error type.
#[derive(Error, Debug)]
pub enum SchedulerError {
    /// A job with the same unique name already exists
    #[error("a job with this unique name already exists")]
    Duplicate,

    /// The job was canceled before completing
    #[error("job was canceled")]
    Canceled,

    /// The deadline had already passed at a check point
    #[error("deadline passed before the job could run")]
    Deadline,

    /// A constraint wait outlived the deadline
    #[error("constraint wait outlived the deadline")]
    Timeout,

    /// `on_retry` decided to cancel after a failure
    #[error("on_retry canceled the job: {source}")]
    OnRetryCancel {
        #[source]
        source: JobError,
    },

    /// The retry budget ran out; the last job failure
    #[error("job failed: {0}")]
    Job(#[from] JobError),

    /// No registered creator recognizes the job type
    #[error("no creator registered for job type '{0}'")]
    UnknownJobType(String),
}

/// Result type alias using SchedulerError.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
