//! Scheduler behavior tests.
//!
//! Execution ordering, constraint gating, retry policies, uniqueness, and
//! persistence are exercised against the real worker tasks with a
//! params-driven test job.

mod uniqueness;

use crate::{Job, JobCompletion, JobCreator, JobError, JobScheduler, RetryDecision};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub(crate) const TEST_JOB_TYPE: &str = "test";

/// Shared observation state for test jobs.
#[derive(Debug, Default)]
pub(crate) struct TestState {
    runs: Mutex<Vec<String>>,
    completions: Mutex<Vec<(String, bool)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl TestState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Labels in run-completion order, including failed runs.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().expect("lock poisoned").clone()
    }

    /// `(label, success)` pairs in terminal order.
    pub fn completions(&self) -> Vec<(String, bool)> {
        self.completions.lock().expect("lock poisoned").clone()
    }

    /// Highest number of concurrently running jobs observed.
    pub fn max_active(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

/// A job whose behavior is driven by its params:
/// `label`, `failTimes`, `runMs`, and `retry` (fixed | exponential | cancel).
struct TestJob {
    label: String,
    state: Arc<TestState>,
    fail_remaining: u32,
    run_duration: Duration,
    retry_decision: RetryDecision,
}

#[async_trait]
impl Job for TestJob {
    async fn on_run(&mut self, _info: &crate::JobInfo) -> Result<(), JobError> {
        let active = self.state.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_active.fetch_max(active, Ordering::SeqCst);

        if !self.run_duration.is_zero() {
            tokio::time::sleep(self.run_duration).await;
        }

        self.state
            .runs
            .lock()
            .expect("lock poisoned")
            .push(self.label.clone());
        self.state.active.fetch_sub(1, Ordering::SeqCst);

        if self.fail_remaining > 0 {
            self.fail_remaining -= 1;
            return Err(JobError::Message("induced failure".to_string()));
        }
        Ok(())
    }

    fn on_retry(&self, _error: &JobError) -> RetryDecision {
        self.retry_decision
    }

    fn on_remove(&mut self, completion: &JobCompletion) {
        self.state
            .completions
            .lock()
            .expect("lock poisoned")
            .push((self.label.clone(), completion.is_success()));
    }
}

pub(crate) struct TestCreator {
    pub state: Arc<TestState>,
}

impl JobCreator for TestCreator {
    fn create(&self, job_type: &str, params: &Value) -> Option<Box<dyn Job>> {
        if job_type != TEST_JOB_TYPE {
            return None;
        }

        let label = params
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or("job")
            .to_string();
        let fail_remaining = params.get("failTimes").and_then(Value::as_u64).unwrap_or(0) as u32;
        let run_ms = params.get("runMs").and_then(Value::as_u64).unwrap_or(0);
        let retry_decision = match params.get("retry").and_then(Value::as_str) {
            Some("cancel") => RetryDecision::Cancel,
            Some("exponential") => RetryDecision::Exponential {
                initial: Duration::from_millis(40),
            },
            _ => RetryDecision::Retry(Duration::from_millis(20)),
        };

        Some(Box::new(TestJob {
            label,
            state: self.state.clone(),
            fail_remaining,
            run_duration: Duration::from_millis(run_ms),
            retry_decision,
        }))
    }
}

/// Builds a scheduler with the test creator registered.
pub(crate) async fn test_scheduler(state: &Arc<TestState>) -> JobScheduler {
    JobScheduler::builder("test-queue")
        .creator(Arc::new(TestCreator {
            state: state.clone(),
        }))
        .build()
        .await
}

/// Polls a condition until it holds or the timeout elapses.
pub(crate) async fn wait_for<F: Fn() -> bool>(condition: F, timeout_ms: u64) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
