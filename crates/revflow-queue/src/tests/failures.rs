//! Failure behavior tests.
//!
//! Rules covered:
//! - While the consumer fails, size never decreases and equals the emit count
//! - After the consumer recovers, everything is delivered in FIFO order
//!   (at-least-once)
//! - A stopped queue stores but never consumes
//! - A fetch failure halts the drain without losing data

use super::{memory_queue, message_with_id};
use crate::{MessageQueue, QueueOptions, QueueState, RecordingConsumer};
use revflow_storage::{MemoryStorage, MessageStorage, StorageError, StorageResult};
use revflow_events::Message;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn failing_consumer_keeps_all_messages() {
    let options = QueueOptions::windowed(Duration::from_millis(200), 100);
    let (queue, consumer) = memory_queue(options);
    consumer.set_always_fail(true);
    queue.start_runloop().await;

    for i in 0..6 {
        queue.emit(message_with_id(&format!("m{i}"))).await;
    }

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(queue.size().await.unwrap(), 6);
    assert!(consumer.attempts() >= 1);
    assert!(consumer.batches().is_empty());
}

#[tokio::test]
async fn consumer_recovery_delivers_everything_in_order() {
    let options = QueueOptions::windowed(Duration::from_millis(200), 100);
    let (queue, consumer) = memory_queue(options);
    consumer.fail_times(1);
    queue.start_runloop().await;

    for i in 0..6 {
        queue.emit(message_with_id(&format!("m{i}"))).await;
    }

    tokio::time::sleep(Duration::from_millis(1200)).await;

    assert_eq!(queue.size().await.unwrap(), 0);
    assert_eq!(consumer.total_messages(), 6);
    assert!(consumer.attempts() >= 2);

    let delivered: Vec<String> = consumer.batch_ids().into_iter().flatten().collect();
    assert_eq!(delivered, vec!["m0", "m1", "m2", "m3", "m4", "m5"]);
}

#[tokio::test]
async fn stopped_queue_stores_without_consuming() {
    let (queue, consumer) = memory_queue(QueueOptions::immediate());
    queue.start_runloop().await;
    queue.stop();
    assert_eq!(queue.state(), QueueState::Stopped);

    for i in 0..3 {
        queue.emit(message_with_id(&format!("m{i}"))).await;
    }

    assert_eq!(queue.size().await.unwrap(), 3);
    assert!(consumer.batches().is_empty());
}

#[tokio::test]
async fn stop_is_terminal() {
    let (queue, consumer) = memory_queue(QueueOptions::immediate());
    queue.start_runloop().await;
    queue.stop();

    // A stopped instance cannot be restarted.
    queue.start_runloop().await;
    assert_eq!(queue.state(), QueueState::Stopped);

    queue.emit(message_with_id("m0")).await;
    assert!(consumer.batches().is_empty());
}

/// Storage wrapper whose fetch can be made to fail.
struct FailingStorage {
    inner: MemoryStorage,
    fail_fetch: AtomicBool,
}

impl FailingStorage {
    fn new() -> Self {
        Self {
            inner: MemoryStorage::new(),
            fail_fetch: AtomicBool::new(false),
        }
    }
}

impl MessageStorage for FailingStorage {
    fn store(&self, message: &Message) -> StorageResult<()> {
        self.inner.store(message)
    }

    fn fetch(&self, limit: usize) -> StorageResult<Vec<Message>> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(StorageError::Decode("injected fetch failure".to_string()));
        }
        self.inner.fetch(limit)
    }

    fn delete(&self, ids: &[String]) -> StorageResult<()> {
        self.inner.delete(ids)
    }

    fn size(&self) -> StorageResult<usize> {
        self.inner.size()
    }

    fn clear(&self) -> StorageResult<()> {
        self.inner.clear()
    }
}

#[tokio::test]
async fn fetch_failure_halts_drain_without_losing_data() {
    let storage = Arc::new(FailingStorage::new());
    let consumer = Arc::new(RecordingConsumer::new());
    let queue = MessageQueue::with_storage(
        "test",
        storage.clone(),
        QueueOptions::windowed(Duration::from_millis(200), 100),
        consumer.clone(),
    );
    queue.start_runloop().await;

    storage.fail_fetch.store(true, Ordering::SeqCst);
    for i in 0..4 {
        queue.emit(message_with_id(&format!("m{i}"))).await;
    }

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(consumer.batches().is_empty());
    assert_eq!(queue.size().await.unwrap(), 4);

    // Fetch recovers; the next tick drains the backlog.
    storage.fail_fetch.store(false, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(queue.size().await.unwrap(), 0);
    assert_eq!(consumer.total_messages(), 4);
}
