//! The job scheduler: per-group serial workers with constraint gating,
//! retries, and persistence.

use crate::backoff::compute_backoff;
use crate::error::{SchedulerError, SchedulerResult};
use crate::info::{JobInfo, UniquePolicy};
use crate::job::{Job, JobCompletion, JobCreator, JobState, RetryDecision};
use crate::listener::SchedulerListener;
use crate::monitor::{ChargingMonitor, HostChargingMonitor, HostNetworkMonitor, NetworkMonitor};
use crate::persister::{JobPersister, MemoryPersister};
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// A constraint-aware background job runner.
///
/// Jobs are routed to per-group worker tasks: within a group execution is
/// serial, across groups parallel. Each job honors its delay, deadline,
/// network/charging gates, and retry policy; persisted jobs are replayed
/// through the registered creators when the scheduler is rebuilt.
///
/// Cheap to clone; clones share all state.
#[derive(Clone)]
pub struct JobScheduler {
    ctx: Arc<SchedulerContext>,
    groups: Arc<tokio::sync::Mutex<HashMap<String, mpsc::UnboundedSender<ScheduledJob>>>>,
}

struct SchedulerContext {
    queue_name: String,
    creators: Vec<Arc<dyn JobCreator>>,
    persister: Arc<dyn JobPersister>,
    network: Arc<dyn NetworkMonitor>,
    charging: Arc<dyn ChargingMonitor>,
    listeners: Vec<Arc<dyn SchedulerListener>>,
    /// unique name -> live job uuid
    unique_names: Mutex<HashMap<String, String>>,
    /// job uuid -> cancel handle
    cancels: Mutex<HashMap<String, CancelHandle>>,
}

struct CancelHandle {
    sender: watch::Sender<bool>,
    tags: BTreeSet<String>,
}

struct ScheduledJob {
    info: JobInfo,
    job: Box<dyn Job>,
    cancel: watch::Receiver<bool>,
}

/// Configures and constructs a [`JobScheduler`].
pub struct JobSchedulerBuilder {
    queue_name: String,
    creators: Vec<Arc<dyn JobCreator>>,
    persister: Option<Arc<dyn JobPersister>>,
    network: Option<Arc<dyn NetworkMonitor>>,
    charging: Option<Arc<dyn ChargingMonitor>>,
    listeners: Vec<Arc<dyn SchedulerListener>>,
}

impl JobSchedulerBuilder {
    /// Registers a job creator.
    pub fn creator(mut self, creator: Arc<dyn JobCreator>) -> Self {
        self.creators.push(creator);
        self
    }

    /// Sets the persister. Defaults to an in-memory persister.
    pub fn persister(mut self, persister: Arc<dyn JobPersister>) -> Self {
        self.persister = Some(persister);
        self
    }

    /// Sets the network monitor. Defaults to always-online.
    pub fn network(mut self, network: Arc<dyn NetworkMonitor>) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets the charging monitor. Defaults to always-charging.
    pub fn charging(mut self, charging: Arc<dyn ChargingMonitor>) -> Self {
        self.charging = Some(charging);
        self
    }

    /// Adds a lifecycle listener.
    pub fn listener(mut self, listener: Arc<dyn SchedulerListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Builds the scheduler and replays persisted jobs for its queue name in
    /// insertion order.
    pub async fn build(self) -> JobScheduler {
        let scheduler = JobScheduler {
            ctx: Arc::new(SchedulerContext {
                queue_name: self.queue_name,
                creators: self.creators,
                persister: self
                    .persister
                    .unwrap_or_else(|| Arc::new(MemoryPersister::new())),
                network: self
                    .network
                    .unwrap_or_else(|| Arc::new(HostNetworkMonitor::always_online())),
                charging: self
                    .charging
                    .unwrap_or_else(|| Arc::new(HostChargingMonitor::always_charging())),
                listeners: self.listeners,
                unique_names: Mutex::new(HashMap::new()),
                cancels: Mutex::new(HashMap::new()),
            }),
            groups: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
        };

        scheduler.restore().await;
        scheduler
    }
}

impl JobScheduler {
    /// Starts building a scheduler for the given queue name.
    pub fn builder(queue_name: impl Into<String>) -> JobSchedulerBuilder {
        JobSchedulerBuilder {
            queue_name: queue_name.into(),
            creators: Vec::new(),
            persister: None,
            network: None,
            charging: None,
            listeners: Vec::new(),
        }
    }

    /// Returns the queue name this scheduler persists under.
    pub fn queue_name(&self) -> &str {
        &self.ctx.queue_name
    }

    /// Schedules a job described by its metadata.
    ///
    /// The job instance is produced by the registered creators from
    /// `job_type` and `params`. Returns the job uuid.
    pub async fn schedule(&self, mut info: JobInfo) -> SchedulerResult<String> {
        let job = self
            .ctx
            .creators
            .iter()
            .find_map(|c| c.create(&info.job_type, &info.params))
            .ok_or_else(|| SchedulerError::UnknownJobType(info.job_type.clone()))?;

        // Uniqueness is decided before the job is enqueued anywhere.
        if let Some(unique) = info.unique.clone() {
            let existing = self
                .ctx
                .unique_names
                .lock()
                .expect("lock poisoned")
                .get(&unique.name)
                .cloned();

            if let Some(prior_uuid) = existing {
                match unique.policy {
                    UniquePolicy::DropIncoming | UniquePolicy::Reject => {
                        debug!(
                            name = %unique.name,
                            prior = %prior_uuid,
                            "Rejecting duplicate job"
                        );
                        return Err(SchedulerError::Duplicate);
                    }
                    UniquePolicy::DropExisting => {
                        info!(name = %unique.name, prior = %prior_uuid, "Replacing existing job");
                        self.cancel_uuid(&prior_uuid);
                    }
                }
            }

            self.ctx
                .unique_names
                .lock()
                .expect("lock poisoned")
                .insert(unique.name, info.uuid.clone());
        }

        info.state = JobState::Scheduled;
        persist_state(&self.ctx, &info);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        self.ctx.cancels.lock().expect("lock poisoned").insert(
            info.uuid.clone(),
            CancelHandle {
                sender: cancel_tx,
                tags: info.tags.clone(),
            },
        );

        for listener in &self.ctx.listeners {
            listener.on_scheduled(&info);
        }

        let uuid = info.uuid.clone();
        debug!(
            uuid = %uuid,
            job_type = %info.job_type,
            group = %info.effective_group(),
            quality = ?info.quality,
            "Job scheduled"
        );

        let sender = self.group_sender(info.effective_group()).await;
        if sender
            .send(ScheduledJob {
                info,
                job,
                cancel: cancel_rx,
            })
            .is_err()
        {
            warn!(uuid = %uuid, "Group worker unavailable");
        }

        Ok(uuid)
    }

    /// Cancels a job by uuid. Observed at the next suspension point.
    pub fn cancel_uuid(&self, uuid: &str) {
        if let Some(handle) = self.ctx.cancels.lock().expect("lock poisoned").get(uuid) {
            let _ = handle.sender.send(true);
        }
    }

    /// Cancels every job carrying the tag.
    pub fn cancel_tag(&self, tag: &str) {
        for handle in self.ctx.cancels.lock().expect("lock poisoned").values() {
            if handle.tags.contains(tag) {
                let _ = handle.sender.send(true);
            }
        }
    }

    /// Cancels every live job.
    pub fn cancel_all(&self) {
        for handle in self.ctx.cancels.lock().expect("lock poisoned").values() {
            let _ = handle.sender.send(true);
        }
    }

    /// Number of jobs that are scheduled or running.
    pub fn live_count(&self) -> usize {
        self.ctx.cancels.lock().expect("lock poisoned").len()
    }

    /// Replays persisted jobs through the registered creators.
    async fn restore(&self) {
        let blobs = self.ctx.persister.restore(&self.ctx.queue_name);
        if blobs.is_empty() {
            return;
        }
        info!(
            queue = %self.ctx.queue_name,
            count = blobs.len(),
            "Restoring persisted jobs"
        );

        for blob in blobs {
            let job_info = match JobInfo::from_json(&blob) {
                Ok(job_info) => job_info,
                Err(e) => {
                    warn!(error = %e, "Dropping malformed persisted job");
                    continue;
                }
            };

            let uuid = job_info.uuid.clone();
            match self.schedule(job_info).await {
                Ok(_) => {}
                Err(SchedulerError::UnknownJobType(job_type)) => {
                    warn!(uuid = %uuid, job_type = %job_type, "No creator for persisted job, removing");
                    self.ctx.persister.remove(&self.ctx.queue_name, &uuid);
                }
                Err(e) => {
                    warn!(uuid = %uuid, error = %e, "Failed to restore persisted job");
                }
            }
        }
    }

    async fn group_sender(&self, group: &str) -> mpsc::UnboundedSender<ScheduledJob> {
        let mut groups = self.groups.lock().await;
        if let Some(sender) = groups.get(group) {
            return sender.clone();
        }

        let (sender, mut receiver) = mpsc::unbounded_channel::<ScheduledJob>();
        let ctx = self.ctx.clone();
        let group_name = group.to_string();

        tokio::spawn(async move {
            debug!(group = %group_name, "Group worker started");
            while let Some(scheduled) = receiver.recv().await {
                run_job(&ctx, scheduled).await;
            }
            debug!(group = %group_name, "Group worker stopped");
        });

        groups.insert(group.to_string(), sender.clone());
        sender
    }
}

/// Outcome of a constraint wait.
enum ConstraintWait {
    Ready,
    Canceled,
    DeadlineDuringWait,
}

/// Runs one job to its terminal state and releases its bookkeeping.
async fn run_job(ctx: &Arc<SchedulerContext>, scheduled: ScheduledJob) {
    let ScheduledJob {
        mut info,
        mut job,
        mut cancel,
    } = scheduled;

    let completion = execute(ctx, &mut info, job.as_mut(), &mut cancel).await;
    info.state = JobState::Terminated;

    match &completion {
        JobCompletion::Success => debug!(uuid = %info.uuid, "Job completed"),
        JobCompletion::Fail(e) => warn!(uuid = %info.uuid, error = %e, "Job failed terminally"),
    }

    job.on_remove(&completion);
    for listener in &ctx.listeners {
        listener.on_terminated(&info, &completion);
    }

    if let Some(unique) = &info.unique {
        let mut names = ctx.unique_names.lock().expect("lock poisoned");
        if names.get(&unique.name) == Some(&info.uuid) {
            names.remove(&unique.name);
        }
    }
    ctx.cancels.lock().expect("lock poisoned").remove(&info.uuid);
    if info.persist {
        ctx.persister.remove(&ctx.queue_name, &info.uuid);
    }
}

/// Drives a job through delay, constraint gates, runs, and retries.
async fn execute(
    ctx: &Arc<SchedulerContext>,
    info: &mut JobInfo,
    job: &mut dyn Job,
    cancel: &mut watch::Receiver<bool>,
) -> JobCompletion {
    if let Some(delay) = info.delay() {
        if !sleep_unless_canceled(delay, cancel).await {
            return JobCompletion::Fail(SchedulerError::Canceled);
        }
    }

    let total_runs = info.periodic.map_or(1, |p| p.count.max(1));
    let run_interval = info.periodic.map(|p| p.interval());

    for run_index in 0..total_runs {
        if run_index > 0 {
            let interval = run_interval.unwrap_or(Duration::ZERO);
            if !sleep_unless_canceled(interval, cancel).await {
                return JobCompletion::Fail(SchedulerError::Canceled);
            }
        }

        let mut attempt: u32 = 0;
        let mut retries_left = info.max_retries;

        loop {
            if *cancel.borrow() {
                return JobCompletion::Fail(SchedulerError::Canceled);
            }
            if deadline_passed(info) {
                return JobCompletion::Fail(SchedulerError::Deadline);
            }

            set_state(ctx, info, JobState::WaitingForConstraints);
            match wait_for_constraints(ctx, info, cancel).await {
                ConstraintWait::Ready => {}
                ConstraintWait::Canceled => {
                    return JobCompletion::Fail(SchedulerError::Canceled)
                }
                ConstraintWait::DeadlineDuringWait => {
                    return JobCompletion::Fail(SchedulerError::Timeout)
                }
            }

            set_state(ctx, info, JobState::Running);
            for listener in &ctx.listeners {
                listener.on_before_run(info);
            }

            let result = tokio::select! {
                result = job.on_run(info) => result,
                _ = cancel.changed() => return JobCompletion::Fail(SchedulerError::Canceled),
            };

            for listener in &ctx.listeners {
                listener.on_after_run(info, &result);
            }

            match result {
                Ok(()) => break,
                Err(e) => {
                    if retries_left == 0 {
                        return JobCompletion::Fail(SchedulerError::Job(e));
                    }
                    if retries_left > 0 {
                        retries_left -= 1;
                    }
                    attempt += 1;

                    let delay = match job.on_retry(&e) {
                        RetryDecision::Cancel => {
                            return JobCompletion::Fail(SchedulerError::OnRetryCancel {
                                source: e,
                            })
                        }
                        RetryDecision::Retry(d) | RetryDecision::RetryAfter(d) => d,
                        RetryDecision::Exponential { initial } => {
                            compute_backoff(initial, attempt)
                        }
                    };

                    set_state(ctx, info, JobState::Retrying);
                    debug!(
                        uuid = %info.uuid,
                        attempt = attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying job"
                    );

                    if !sleep_unless_canceled(delay, cancel).await {
                        return JobCompletion::Fail(SchedulerError::Canceled);
                    }
                }
            }
        }
    }

    JobCompletion::Success
}

/// Waits for network and charging gates, re-checking on every state change.
async fn wait_for_constraints(
    ctx: &Arc<SchedulerContext>,
    info: &JobInfo,
    cancel: &mut watch::Receiver<bool>,
) -> ConstraintWait {
    if let Some(required) = info.requires_network {
        let mut network = ctx.network.subscribe();
        while !network.borrow().satisfies(required) {
            debug!(uuid = %info.uuid, required = ?required, "Waiting for network reachability");
            if let Some(outcome) = gate_step(&mut network, info, cancel).await {
                return outcome;
            }
        }
    }

    if info.requires_charging {
        let mut charging = ctx.charging.subscribe();
        while !*charging.borrow() {
            debug!(uuid = %info.uuid, "Waiting for charging");
            if let Some(outcome) = gate_step(&mut charging, info, cancel).await {
                return outcome;
            }
        }
    }

    ConstraintWait::Ready
}

/// One wait step on a gate channel. `None` means the gate changed and the
/// caller should re-check it.
async fn gate_step<T>(
    gate: &mut watch::Receiver<T>,
    info: &JobInfo,
    cancel: &mut watch::Receiver<bool>,
) -> Option<ConstraintWait> {
    let deadline_sleep = async {
        match info.deadline {
            Some(deadline) => {
                let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                tokio::time::sleep(remaining).await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        changed = gate.changed() => {
            if changed.is_err() {
                // Monitor gone; the gate can never be satisfied.
                Some(ConstraintWait::Canceled)
            } else {
                None
            }
        }
        _ = cancel.changed() => Some(ConstraintWait::Canceled),
        _ = deadline_sleep => Some(ConstraintWait::DeadlineDuringWait),
    }
}

/// Sleeps for the duration unless canceled first. Returns false on cancel.
async fn sleep_unless_canceled(duration: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    if *cancel.borrow() {
        return false;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => true,
        _ = cancel.changed() => false,
    }
}

fn deadline_passed(info: &JobInfo) -> bool {
    info.deadline.map_or(false, |deadline| Utc::now() >= deadline)
}

/// Records a state transition, re-persisting when the job is durable.
fn set_state(ctx: &Arc<SchedulerContext>, info: &mut JobInfo, state: JobState) {
    info.state = state;
    persist_state(ctx, info);
}

fn persist_state(ctx: &Arc<SchedulerContext>, info: &JobInfo) {
    if !info.persist {
        return;
    }
    match info.to_json() {
        Ok(blob) => ctx.persister.put(&ctx.queue_name, &info.uuid, &blob),
        Err(e) => warn!(uuid = %info.uuid, error = %e, "Failed to serialize job for persistence"),
    }
}
