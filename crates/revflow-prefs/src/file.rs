//! File-backed preference store.

use crate::{PreferenceStore, PrefsResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// A preference store backed by a single JSON object file.
///
/// The whole map is loaded at open and rewritten on every mutation, so the
/// on-disk state always reflects the last completed call.
pub struct FilePreferences {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FilePreferences {
    /// Opens a preference file, creating parent directories if needed.
    ///
    /// A missing file is treated as an empty store.
    pub fn open(path: impl AsRef<Path>) -> PrefsResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), "Opened preference file");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> PrefsResult<()> {
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferences {
    fn set(&self, key: &str, value: &str) -> PrefsResult<()> {
        let mut values = self.values.lock().expect("lock poisoned");
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn get(&self, key: &str) -> PrefsResult<Option<String>> {
        Ok(self.values.lock().expect("lock poisoned").get(key).cloned())
    }

    fn delete(&self, key: &str) -> PrefsResult<bool> {
        let mut values = self.values.lock().expect("lock poisoned");
        let existed = values.remove(key).is_some();
        if existed {
            self.flush(&values)?;
        }
        Ok(existed)
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
    use tempfile::tempdir;

    #[test]
    fn persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        {
            let prefs = FilePreferences::open(&path).unwrap();
            prefs.set("a", "1").unwrap();
            prefs.set("b", "2").unwrap();
            prefs.delete("a").unwrap();
        }

        let prefs = FilePreferences::open(&path).unwrap();
        assert!(prefs.get("a").unwrap().is_none());
        assert_eq!(prefs.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn missing_file_is_empty_store() {
        let dir = tempdir().unwrap();
        let prefs = FilePreferences::open(dir.path().join("nope.json")).unwrap();
        assert!(prefs.get("anything").unwrap().is_none());
        assert!(prefs.keys_with_prefix("").unwrap().is_empty());
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("prefs.json");
        let prefs = FilePreferences::open(&path).unwrap();
        prefs.set("k", "v").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn malformed_file_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(FilePreferences::open(&path).is_err());
    }
}
