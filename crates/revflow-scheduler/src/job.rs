//! The job contract.

use crate::error::{JobError, SchedulerError};
use crate::info::JobInfo;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lifecycle state of a scheduled job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Scheduled,
    WaitingForConstraints,
    Ready,
    Running,
    Retrying,
    Terminated,
}

/// Retry policy returned by [`Job::on_retry`] after a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after a fixed delay.
    Retry(Duration),
    /// Retry with exponential backoff: `initial * 2^(attempt - 1)`.
    Exponential { initial: Duration },
    /// Retry after a delay dictated externally (e.g. a Retry-After header).
    RetryAfter(Duration),
    /// Give up; the job terminates with `on_retry_cancel`.
    Cancel,
}

/// Terminal outcome handed to [`Job::on_remove`].
#[derive(Debug)]
pub enum JobCompletion {
    Success,
    Fail(SchedulerError),
}

impl JobCompletion {
    /// Returns true for a successful completion.
    pub fn is_success(&self) -> bool {
        matches!(self, JobCompletion::Success)
    }
}

/// A unit of background work executed by the scheduler.
///
/// `on_run` performs the work; its future resolving is the completion signal.
/// On failure the scheduler consults `on_retry` for the next step, and on
/// terminal removal — success or final failure — `on_remove` fires exactly
/// once.
#[async_trait]
pub trait Job: Send {
    /// Perform the work. May suspend; the scheduler honors cancellation and
    /// deadlines around it.
    async fn on_run(&mut self, info: &JobInfo) -> Result<(), JobError>;

    /// Decide what to do after a failed run. Consulted only while retry
    /// budget remains.
    fn on_retry(&self, error: &JobError) -> RetryDecision;

    /// Terminal callback, fired once per job.
    fn on_remove(&mut self, _completion: &JobCompletion) {}
}

/// Instantiates jobs from their persisted type and params.
///
/// Creators serve both fresh scheduling and restore-on-construction: a
/// persisted job is only runnable if some registered creator recognizes its
/// type.
pub trait JobCreator: Send + Sync {
    /// Returns a job for the type, or `None` if this creator does not handle
    /// it.
    fn create(&self, job_type: &str, params: &serde_json::Value) -> Option<Box<dyn Job>>;
}
