//! Job persistence across process restarts.

use revflow_prefs::{keys, PreferenceStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{error, warn};

/// Key-value persistence for scheduled jobs, keyed by queue name and uuid.
///
/// Persistence is best-effort: a failed write costs a restore after the next
/// restart, never correctness of the live scheduler. `restore` returns blobs
/// in original insertion order.
pub trait JobPersister: Send + Sync {
    /// Returns all persisted blobs for a queue, oldest first.
    fn restore(&self, queue_name: &str) -> Vec<String>;

    /// Upserts a blob. An existing entry keeps its position in the order.
    fn put(&self, queue_name: &str, job_uuid: &str, blob: &str);

    /// Removes an entry.
    fn remove(&self, queue_name: &str, job_uuid: &str);

    /// Removes everything, across all queues.
    fn clear_all(&self);
}

/// In-memory persister for tests.
#[derive(Debug, Default)]
pub struct MemoryPersister {
    queues: Mutex<HashMap<String, Vec<(String, String)>>>,
}

impl MemoryPersister {
    /// Creates an empty persister.
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobPersister for MemoryPersister {
    fn restore(&self, queue_name: &str) -> Vec<String> {
        self.queues
            .lock()
            .expect("lock poisoned")
            .get(queue_name)
            .map(|entries| entries.iter().map(|(_, blob)| blob.clone()).collect())
            .unwrap_or_default()
    }

    fn put(&self, queue_name: &str, job_uuid: &str, blob: &str) {
        let mut queues = self.queues.lock().expect("lock poisoned");
        let entries = queues.entry(queue_name.to_string()).or_default();
        if let Some(entry) = entries.iter_mut().find(|(uuid, _)| uuid == job_uuid) {
            entry.1 = blob.to_string();
        } else {
            entries.push((job_uuid.to_string(), blob.to_string()));
        }
    }

    fn remove(&self, queue_name: &str, job_uuid: &str) {
        let mut queues = self.queues.lock().expect("lock poisoned");
        if let Some(entries) = queues.get_mut(queue_name) {
            entries.retain(|(uuid, _)| uuid != job_uuid);
        }
    }

    fn clear_all(&self) {
        self.queues.lock().expect("lock poisoned").clear();
    }
}

/// Persister over the host preference store.
///
/// Entries live at `revflow.jobs.<queue>.<uuid>`; insertion order is kept in
/// a JSON array at `revflow.jobs.<queue>.__index`.
pub struct PreferencePersister {
    prefs: Arc<dyn PreferenceStore>,
}

impl PreferencePersister {
    /// Creates a persister over the given preference store.
    pub fn new(prefs: Arc<dyn PreferenceStore>) -> Self {
        Self { prefs }
    }

    fn entry_key(queue_name: &str, job_uuid: &str) -> String {
        format!("{}.{queue_name}.{job_uuid}", keys::JOBS_KEY_PREFIX)
    }

    fn index_key(queue_name: &str) -> String {
        format!("{}.{queue_name}.__index", keys::JOBS_KEY_PREFIX)
    }

    fn read_index(&self, queue_name: &str) -> Vec<String> {
        match self.prefs.get(&Self::index_key(queue_name)) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(queue = %queue_name, error = %e, "Malformed job index, resetting");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(queue = %queue_name, error = %e, "Failed to read job index");
                Vec::new()
            }
        }
    }

    fn write_index(&self, queue_name: &str, index: &[String]) {
        let raw = match serde_json::to_string(index) {
            Ok(raw) => raw,
            Err(e) => {
                error!(queue = %queue_name, error = %e, "Failed to encode job index");
                return;
            }
        };
        if let Err(e) = self.prefs.set(&Self::index_key(queue_name), &raw) {
            error!(queue = %queue_name, error = %e, "Failed to write job index");
        }
    }
}

impl JobPersister for PreferencePersister {
    fn restore(&self, queue_name: &str) -> Vec<String> {
        self.read_index(queue_name)
            .iter()
            .filter_map(|uuid| {
                match self.prefs.get(&Self::entry_key(queue_name, uuid)) {
                    Ok(Some(blob)) => Some(blob),
                    Ok(None) => None,
                    Err(e) => {
                        error!(queue = %queue_name, job = %uuid, error = %e, "Failed to read persisted job");
                        None
                    }
                }
            })
            .collect()
    }

    fn put(&self, queue_name: &str, job_uuid: &str, blob: &str) {
        if let Err(e) = self.prefs.set(&Self::entry_key(queue_name, job_uuid), blob) {
            error!(queue = %queue_name, job = %job_uuid, error = %e, "Failed to persist job");
            return;
        }

        let mut index = self.read_index(queue_name);
        if !index.iter().any(|uuid| uuid == job_uuid) {
            index.push(job_uuid.to_string());
            self.write_index(queue_name, &index);
        }
    }

    fn remove(&self, queue_name: &str, job_uuid: &str) {
        if let Err(e) = self.prefs.delete(&Self::entry_key(queue_name, job_uuid)) {
            error!(queue = %queue_name, job = %job_uuid, error = %e, "Failed to remove persisted job");
        }

        let mut index = self.read_index(queue_name);
        let before = index.len();
        index.retain(|uuid| uuid != job_uuid);
        if index.len() != before {
            self.write_index(queue_name, &index);
        }
    }

    fn clear_all(&self) {
        let prefix = format!("{}.", keys::JOBS_KEY_PREFIX);
        match self.prefs.keys_with_prefix(&prefix) {
            Ok(all_keys) => {
                for key in all_keys {
                    let _ = self.prefs.delete(&key);
                }
            }
            Err(e) => error!(error = %e, "Failed to list persisted jobs"),
        }
    }
}
