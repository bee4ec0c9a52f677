//! The message queue state machine.

use crate::consumer::MessageConsumer;
use crate::error::QueueResult;
use crate::options::{QueueOptions, DEFAULT_FETCH_LIMIT};
use revflow_config::Paths;
use revflow_events::Message;
use revflow_storage::{MemoryStorage, MessageStorage, SqliteStorage};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Pause after a consumer failure before the drain loop yields its turn.
const CONSUME_RETRY_PAUSE: Duration = Duration::from_millis(100);

/// Pause after a storage fetch failure.
const FETCH_RETRY_PAUSE: Duration = Duration::from_millis(500);

/// Lifecycle state of a queue.
///
/// `Stopped` is terminal: a queue instance cannot be restarted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueueState {
    Idle,
    Processing,
    Stopped,
}

/// A durable FIFO message queue with count-and-time batching.
///
/// Messages are durable in storage before [`emit`](MessageQueue::emit)
/// returns; delivery happens through the configured [`MessageConsumer`],
/// either per-emit or on batching triggers. See the crate docs for the write
/// path.
pub struct MessageQueue {
    name: String,
    options: QueueOptions,
    storage: Arc<dyn MessageStorage>,
    consumer: Arc<dyn MessageConsumer>,
    state: Arc<Mutex<QueueState>>,
    drain_lock: Arc<tokio::sync::Mutex<()>>,
    timer: Mutex<Option<TimerTask>>,
}

struct TimerTask {
    shutdown: watch::Sender<bool>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MessageQueue {
    /// Creates a queue with its database in the default documents location.
    ///
    /// On database open failure the queue falls back to in-memory storage;
    /// messages emitted in fallback mode do not survive a restart.
    pub fn new(
        name: impl Into<String>,
        options: QueueOptions,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        let name = name.into();
        let path = Paths::new().database_file(&name);
        Self::at_path(name, path, options, consumer)
    }

    /// Creates a queue with its database at an explicit path.
    ///
    /// Same fallback behavior as [`new`](MessageQueue::new).
    pub fn at_path(
        name: impl Into<String>,
        path: impl AsRef<Path>,
        options: QueueOptions,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        let name = name.into();
        let storage: Arc<dyn MessageStorage> = match SqliteStorage::open(path.as_ref()) {
            Ok(storage) => Arc::new(storage),
            Err(e) => {
                warn!(
                    queue = %name,
                    path = %path.as_ref().display(),
                    error = %e,
                    "Failed to open message database, falling back to in-memory storage; \
                     buffered messages will not survive a restart"
                );
                Arc::new(MemoryStorage::new())
            }
        };
        Self::with_storage(name, storage, options, consumer)
    }

    /// Creates a queue over an injected storage backend.
    pub fn with_storage(
        name: impl Into<String>,
        storage: Arc<dyn MessageStorage>,
        options: QueueOptions,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        Self {
            name: name.into(),
            options,
            storage,
            consumer,
            state: Arc::new(Mutex::new(QueueState::Idle)),
            drain_lock: Arc::new(tokio::sync::Mutex::new(())),
            timer: Mutex::new(None),
        }
    }

    /// Returns the queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> QueueState {
        *self.state.lock().expect("lock poisoned")
    }

    /// Appends a message to storage and triggers processing if needed.
    ///
    /// Never blocks the producer on delivery and never surfaces an error;
    /// storage failures are logged.
    pub async fn emit(&self, message: Message) {
        if let Err(e) = self.storage.store(&message) {
            error!(
                queue = %self.name,
                message_id = %message.id,
                error = %e,
                "Failed to store message"
            );
            return;
        }
        debug!(queue = %self.name, message_id = %message.id, "Stored message");

        self.trigger_processing_if_needed().await;
    }

    /// Returns the number of stored messages.
    pub async fn size(&self) -> QueueResult<usize> {
        Ok(self.storage.size()?)
    }

    /// Cancels the batch timer and removes all stored messages.
    ///
    /// An in-flight consume call is not awaited; its deletions against the
    /// cleared table are no-ops.
    pub async fn clear_queue(&self) -> QueueResult<()> {
        self.cancel_timer();
        self.storage.clear()?;
        info!(queue = %self.name, "Queue cleared");
        Ok(())
    }

    /// Starts processing: drains the backlog once, then starts the periodic
    /// batch timer when a batching window is configured.
    ///
    /// Only valid from `Idle`; later calls are no-ops.
    pub async fn start_runloop(&self) {
        {
            let mut state = self.state.lock().expect("lock poisoned");
            if *state != QueueState::Idle {
                debug!(queue = %self.name, state = ?*state, "start_runloop ignored");
                return;
            }
            *state = QueueState::Processing;
        }
        info!(queue = %self.name, "Queue runloop started");

        self.drain().await;

        if let Some(window) = self.options.batching_window {
            let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
            let name = self.name.clone();
            let storage = self.storage.clone();
            let consumer = self.consumer.clone();
            let state = self.state.clone();
            let drain_lock = self.drain_lock.clone();

            let handle = tokio::spawn(async move {
                // First tick after one full window, not immediately.
                let start = tokio::time::Instant::now() + window.time_window;
                let mut ticker = tokio::time::interval_at(start, window.time_window);

                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            drain_queue(
                                &name,
                                &storage,
                                &consumer,
                                &state,
                                &drain_lock,
                                window.max_count,
                            )
                            .await;
                        }
                        _ = shutdown_rx.changed() => break,
                    }
                }
                debug!(queue = %name, "Batch timer stopped");
            });

            *self.timer.lock().expect("lock poisoned") = Some(TimerTask {
                shutdown: shutdown_tx,
                _handle: handle,
            });
        }
    }

    /// Drains the queue once, outside any batching trigger.
    ///
    /// Used for the final flush on process shutdown (and for hosts that want
    /// a manual flush). No-op unless the queue is processing.
    pub async fn flush(&self) {
        self.drain().await;
    }

    /// Stops the queue permanently and cancels the batch timer.
    ///
    /// Messages emitted after `stop` are still stored; they are delivered by
    /// a fresh queue instance on the same storage path.
    pub fn stop(&self) {
        {
            let mut state = self.state.lock().expect("lock poisoned");
            if *state == QueueState::Stopped {
                return;
            }
            *state = QueueState::Stopped;
        }
        self.cancel_timer();
        info!(queue = %self.name, "Queue stopped");
    }

    fn cancel_timer(&self) {
        if let Some(timer) = self.timer.lock().expect("lock poisoned").take() {
            let _ = timer.shutdown.send(true);
        }
    }

    async fn trigger_processing_if_needed(&self) {
        match self.options.batching_window {
            None => self.drain().await,
            Some(window) => match self.storage.size() {
                Ok(size) if size >= window.max_count => self.drain().await,
                Ok(_) => {}
                Err(e) => {
                    warn!(queue = %self.name, error = %e, "Size check failed, deferring to timer")
                }
            },
        }
    }

    async fn drain(&self) {
        let fetch_limit = self
            .options
            .batching_window
            .map_or(DEFAULT_FETCH_LIMIT, |w| w.max_count);

        drain_queue(
            &self.name,
            &self.storage,
            &self.consumer,
            &self.state,
            &self.drain_lock,
            fetch_limit,
        )
        .await;
    }
}

/// Drains the queue: repeatedly fetch, consume, delete until storage is empty
/// or a failure halts progress.
///
/// The drain lock guarantees at most one drain in flight per queue; the state
/// check before every storage touch makes cancellation cooperative.
async fn drain_queue(
    name: &str,
    storage: &Arc<dyn MessageStorage>,
    consumer: &Arc<dyn MessageConsumer>,
    state: &Arc<Mutex<QueueState>>,
    drain_lock: &Arc<tokio::sync::Mutex<()>>,
    fetch_limit: usize,
) {
    let _guard = drain_lock.lock().await;

    loop {
        if *state.lock().expect("lock poisoned") != QueueState::Processing {
            break;
        }

        let batch = match storage.fetch(fetch_limit) {
            Ok(batch) => batch,
            Err(e) => {
                error!(queue = %name, error = %e, "Fetch failed");
                tokio::time::sleep(FETCH_RETRY_PAUSE).await;
                break;
            }
        };
        if batch.is_empty() {
            break;
        }

        let ids: Vec<String> = batch.iter().map(|m| m.id.clone()).collect();
        match consumer.consume(batch).await {
            Ok(()) => {
                if let Err(e) = storage.delete(&ids) {
                    error!(queue = %name, error = %e, "Failed to delete delivered batch");
                    break;
                }
                debug!(queue = %name, count = ids.len(), "Batch consumed");
            }
            Err(e) => {
                warn!(
                    queue = %name,
                    count = ids.len(),
                    error = %e,
                    "Consumer failed, keeping batch for retry"
                );
                tokio::time::sleep(CONSUME_RETRY_PAUSE).await;
                break;
            }
        }
    }
}
