//! The batch consumer contract.

use crate::error::ConsumeError;
use async_trait::async_trait;
use revflow_events::Message;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Receives FIFO batches from the queue.
///
/// A successful return means the consumer has taken responsibility for the
/// batch — the queue then deletes it from storage. On failure the batch stays
/// in storage and is re-attempted on the next trigger.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Consume one batch.
    async fn consume(&self, batch: Vec<Message>) -> Result<(), ConsumeError>;
}

/// A consumer that records all batches, with injectable failures.
///
/// Useful for testing queue behavior.
#[derive(Debug, Default)]
pub struct RecordingConsumer {
    batches: Mutex<Vec<Vec<Message>>>,
    fail_remaining: Mutex<u32>,
    fail_always: AtomicBool,
    attempts: AtomicUsize,
}

impl RecordingConsumer {
    /// Creates a consumer that accepts every batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `n` consume calls fail.
    pub fn fail_times(&self, n: u32) {
        *self.fail_remaining.lock().expect("lock poisoned") = n;
    }

    /// Makes every consume call fail until cleared.
    pub fn set_always_fail(&self, fail: bool) {
        self.fail_always.store(fail, Ordering::SeqCst);
    }

    /// Returns all recorded batches.
    pub fn batches(&self) -> Vec<Vec<Message>> {
        self.batches.lock().expect("lock poisoned").clone()
    }

    /// Returns the recorded batches as id lists.
    pub fn batch_ids(&self) -> Vec<Vec<String>> {
        self.batches
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|batch| batch.iter().map(|m| m.id.clone()).collect())
            .collect()
    }

    /// Total messages across all recorded batches.
    pub fn total_messages(&self) -> usize {
        self.batches
            .lock()
            .expect("lock poisoned")
            .iter()
            .map(|b| b.len())
            .sum()
    }

    /// Number of consume calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageConsumer for RecordingConsumer {
    async fn consume(&self, batch: Vec<Message>) -> Result<(), ConsumeError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_always.load(Ordering::SeqCst) {
            return Err(ConsumeError::Other("injected failure".to_string()));
        }

        {
            let mut remaining = self.fail_remaining.lock().expect("lock poisoned");
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ConsumeError::Other("injected failure".to_string()));
            }
        }

        self.batches.lock().expect("lock poisoned").push(batch);
        Ok(())
    }
}
