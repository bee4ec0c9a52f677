//! In-memory preference store for tests.

use crate::{PreferenceStore, PrefsResult};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// A preference store backed by an in-memory map.
#[derive(Debug, Default)]
pub struct MemoryPreferences {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferences {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().expect("lock poisoned").len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PreferenceStore for MemoryPreferences {
    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        self.values
            .lock()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        Ok(self.values.lock().expect("lock poisoned").get(key).cloned())
    }

    fn delete(&self, key: &str) -> PrefsResult<bool> {
        Ok(self
            .values
            .lock()
            .expect("lock poisoned")
            .remove(key)
            .is_some())
    }

    fn keys_with_prefix(&self, prefix: &str) -> PrefsResult<Vec<String>> {
        Ok(self
            .values
            .lock()
            .expect("lock poisoned")
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;

    #[test]
    fn set_get_delete() {
        let prefs = MemoryPreferences::new();
        assert!(prefs.get("missing").unwrap().is_none());

        prefs.set(keys::ANONYMOUS_ID_KEY, "anon-1").unwrap();
        assert_eq!(
            prefs.get(keys::ANONYMOUS_ID_KEY).unwrap().as_deref(),
            Some("anon-1")
        );
        assert!(prefs.has(keys::ANONYMOUS_ID_KEY).unwrap());

        assert!(prefs.delete(keys::ANONYMOUS_ID_KEY).unwrap());
        assert!(!prefs.delete(keys::ANONYMOUS_ID_KEY).unwrap());
        assert!(prefs.get(keys::ANONYMOUS_ID_KEY).unwrap().is_none());
    }

    #[test]
    fn set_overwrites() {
        let prefs = MemoryPreferences::new();
        prefs.set("k", "v1").unwrap();
        prefs.set("k", "v2").unwrap();
        assert_eq!(prefs.get("k").unwrap().as_deref(), Some("v2"));
        assert_eq!(prefs.len(), 1);
    }

    #[test]
    fn keys_with_prefix_filters() {
        let prefs = MemoryPreferences::new();
        prefs.set("revflow.jobs.main.a", "1").unwrap();
        prefs.set("revflow.jobs.main.b", "2").unwrap();
        prefs.set("revflow.jobs.other.c", "3").unwrap();
        prefs.set("unrelated", "4").unwrap();

        let keys = prefs.keys_with_prefix("revflow.jobs.main.").unwrap();
        assert_eq!(keys, vec!["revflow.jobs.main.a", "revflow.jobs.main.b"]);
    }
}
