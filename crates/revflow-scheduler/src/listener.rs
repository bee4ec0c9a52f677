//! Scheduler observation hooks.

use crate::error::JobError;
use crate::info::JobInfo;
use crate::job::JobCompletion;
use std::sync::Mutex;

/// Observes job lifecycle events.
///
/// For one run the order is `on_scheduled`, `on_before_run`,
/// `on_after_run`, `on_terminated`. Listeners must not mutate scheduler
/// state from inside callbacks.
pub trait SchedulerListener: Send + Sync {
    fn on_scheduled(&self, _info: &JobInfo) {}
    fn on_before_run(&self, _info: &JobInfo) {}
    fn on_after_run(&self, _info: &JobInfo, _result: &Result<(), JobError>) {}
    fn on_terminated(&self, _info: &JobInfo, _completion: &JobCompletion) {}
}

/// A lifecycle event captured by [`RecordingListener`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerEvent {
    Scheduled(String),
    BeforeRun(String),
    AfterRun { uuid: String, ok: bool },
    Terminated { uuid: String, success: bool },
}

/// A listener that records all events for testing.
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<ListenerEvent>>,
}

impl RecordingListener {
    /// Creates an empty recording listener.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    pub fn events(&self) -> Vec<ListenerEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }
}

impl SchedulerListener for RecordingListener {
    fn on_scheduled(&self, info: &JobInfo) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(ListenerEvent::Scheduled(info.uuid.clone()));
    }

    fn on_before_run(&self, info: &JobInfo) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(ListenerEvent::BeforeRun(info.uuid.clone()));
    }

    fn on_after_run(&self, info: &JobInfo, result: &Result<(), JobError>) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(ListenerEvent::AfterRun {
                uuid: info.uuid.clone(),
                ok: result.is_ok(),
            });
    }

    fn on_terminated(&self, info: &JobInfo, completion: &JobCompletion) {
        self.events
            .lock()
            .expect("lock poisoned")
            .push(ListenerEvent::Terminated {
                uuid: info.uuid.clone(),
                success: completion.is_success(),
            });
    }
}
