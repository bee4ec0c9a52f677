//! Scheduled job metadata and constraints.

use crate::job::JobState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Minimum network reachability required before a job may run.
///
/// The ladder is `Any <= Cellular <= Wifi`: requiring `Any` waits for any
/// reachability at all, `Wifi` waits for an unmetered link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetworkKind {
    Any,
    Cellular,
    Wifi,
}

/// Strategy applied when a unique name is already taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UniquePolicy {
    /// Reject the incoming job with a duplicate error.
    DropIncoming,
    /// Cancel the existing job, then accept the incoming one.
    DropExisting,
    /// Reject the incoming job; the existing one is untouched.
    Reject,
}

/// Scheduling priority hint. Carried and logged; a single runtime has no
/// priority lanes to map it onto.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityOfService {
    Background,
    Utility,
    UserInitiated,
}

/// Uniqueness constraint: at most one live job per name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueConstraint {
    pub name: String,
    pub policy: UniquePolicy,
}

/// Periodic execution: up to `count` runs spaced by `interval_ms`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Periodic {
    pub count: u32,
    pub interval_ms: u64,
}

impl Periodic {
    /// Returns the spacing between runs.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Everything the scheduler knows about a job, minus the job instance itself.
///
/// This is the unit of persistence: with `persist` set, the serialized form
/// is written on schedule and on every state change, and replayed through the
/// registered creators on scheduler construction. Transient attempt state is
/// not persisted; a restored job restarts with a fresh retry budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub uuid: String,
    pub job_type: String,
    /// Serializer bucket; jobs in the same group run serially. Defaults to
    /// the job type when unset.
    pub group: Option<String>,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Earliest-run offset from schedule time, in milliseconds.
    pub delay_ms: Option<u64>,
    /// Instant after which the job fails with a deadline error.
    pub deadline: Option<DateTime<Utc>>,
    pub requires_network: Option<NetworkKind>,
    pub requires_charging: bool,
    /// Retry attempts after the first failure; -1 means unbounded.
    pub max_retries: i32,
    pub persist: bool,
    pub unique: Option<UniqueConstraint>,
    pub periodic: Option<Periodic>,
    pub tags: BTreeSet<String>,
    pub quality: QualityOfService,
    pub state: JobState,
}

impl JobInfo {
    /// Creates job metadata with a random uuid and no constraints.
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            group: None,
            params: serde_json::Value::Null,
            created_at: Utc::now(),
            delay_ms: None,
            deadline: None,
            requires_network: None,
            requires_charging: false,
            max_retries: 0,
            persist: false,
            unique: None,
            periodic: None,
            tags: BTreeSet::new(),
            quality: QualityOfService::Background,
            state: JobState::Scheduled,
        }
    }

    /// Returns the serializer bucket this job runs in.
    pub fn effective_group(&self) -> &str {
        self.group.as_deref().unwrap_or(&self.job_type)
    }

    /// Returns the configured initial delay.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Serializes for the persister.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Deserializes a persisted blob.
    pub fn from_json(blob: &str) -> serde_json::Result<Self> {
        serde_json::from_str(blob)
    }
}
