//! Fluent construction of job metadata.

use crate::error::SchedulerResult;
use crate::info::{JobInfo, NetworkKind, Periodic, QualityOfService, UniqueConstraint, UniquePolicy};
use crate::scheduler::JobScheduler;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Builds and schedules a job.
///
/// ```ignore
/// let uuid = JobBuilder::new("SendBatchingMessageJob")
///     .params(serde_json::json!({"messages": batch}))
///     .internet(NetworkKind::Any)
///     .persist()
///     .service(QualityOfService::Background)
///     .schedule(&scheduler)
///     .await?;
/// ```
pub struct JobBuilder {
    info: JobInfo,
}

impl JobBuilder {
    /// Starts a builder for the given job type.
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            info: JobInfo::new(job_type),
        }
    }

    /// Sets the job's parameter payload.
    pub fn params(mut self, params: serde_json::Value) -> Self {
        self.info.params = params;
        self
    }

    /// Requires network reachability of at least the given level.
    pub fn internet(mut self, at_least: NetworkKind) -> Self {
        self.info.requires_network = Some(at_least);
        self
    }

    /// Persists the job across restarts.
    pub fn persist(mut self) -> Self {
        self.info.persist = true;
        self
    }

    /// Delays the earliest run to schedule time plus the duration.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.info.delay_ms = Some(delay.as_millis() as u64);
        self
    }

    /// Fails the job with a deadline error if not completed by the instant.
    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.info.deadline = Some(deadline);
        self
    }

    /// Deduplicates by name under the given policy.
    pub fn unique(mut self, name: impl Into<String>, policy: UniquePolicy) -> Self {
        self.info.unique = Some(UniqueConstraint {
            name: name.into(),
            policy,
        });
        self
    }

    /// Sets the retry budget after the first failure; -1 means unbounded.
    pub fn retry(mut self, max: i32) -> Self {
        self.info.max_retries = max;
        self
    }

    /// Puts the job into a serializer group.
    pub fn group(mut self, name: impl Into<String>) -> Self {
        self.info.group = Some(name.into());
        self
    }

    /// Runs the job up to `count` times, spaced by `interval`.
    pub fn periodic(mut self, count: u32, interval: Duration) -> Self {
        self.info.periodic = Some(Periodic {
            count,
            interval_ms: interval.as_millis() as u64,
        });
        self
    }

    /// Sets the scheduling priority hint.
    pub fn service(mut self, quality: QualityOfService) -> Self {
        self.info.quality = quality;
        self
    }

    /// Adds a single tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.info.tags.insert(tag.into());
        self
    }

    /// Adds a set of tags for bulk cancellation.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.info.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Gates the job on AC power.
    pub fn require_charging(mut self) -> Self {
        self.info.requires_charging = true;
        self
    }

    /// Returns the built metadata without scheduling.
    pub fn build(self) -> JobInfo {
        self.info
    }

    /// Schedules onto the given scheduler; returns the job uuid.
    pub async fn schedule(self, scheduler: &JobScheduler) -> SchedulerResult<String> {
        scheduler.schedule(self.info).await
    }
}
