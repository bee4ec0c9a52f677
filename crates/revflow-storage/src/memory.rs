//! In-memory fallback message storage.

use crate::{MessageStorage, StorageError, StorageResult};
use revflow_events::Message;
use std::collections::HashSet;
use std::sync::Mutex;

/// In-process implementation of [`MessageStorage`].
///
/// Used when the SQLite database cannot be opened. Messages held here do not
/// survive a restart; that trade is deliberate for the telemetry domain.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    messages: Mutex<Vec<Message>>,
}

impl MemoryStorage {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageStorage for MemoryStorage {
    fn store(&self, message: &Message) -> StorageResult<()> {
        let mut messages = self.messages.lock().expect("lock poisoned");
        if messages.iter().any(|m| m.id == message.id) {
            return Err(StorageError::DuplicateId(message.id.clone()));
        }
        messages.push(message.clone());
        Ok(())
    }

    fn fetch(&self, limit: usize) -> StorageResult<Vec<Message>> {
        let messages = self.messages.lock().expect("lock poisoned");
        Ok(messages.iter().take(limit).cloned().collect())
    }

    fn delete(&self, ids: &[String]) -> StorageResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let ids: HashSet<&String> = ids.iter().collect();
        self.messages
            .lock()
            .expect("lock poisoned")
            .retain(|m| !ids.contains(&m.id));
        Ok(())
    }

    fn size(&self) -> StorageResult<usize> {
        Ok(self.messages.lock().expect("lock poisoned").len())
    }

    fn clear(&self) -> StorageResult<()> {
        self.messages.lock().expect("lock poisoned").clear();
        Ok(())
    }
}
