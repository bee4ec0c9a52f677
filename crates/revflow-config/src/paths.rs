//! File system paths for the SDK.

use std::path::PathBuf;

/// Manages file system paths for queue databases and the config file.
///
/// Queue databases live in the host's documents directory; when none exists
/// (headless environments, CI) the temp directory is used instead.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// Creates a new Paths instance rooted at the documents directory,
    /// falling back to the temp directory.
    pub fn new() -> Self {
        let base_dir = dirs::document_dir().unwrap_or_else(std::env::temp_dir);
        Self { base_dir }
    }

    /// Creates a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Returns the base directory.
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Returns the config file path (`<base>/revflow-config.json`).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("revflow-config.json")
    }

    /// Returns the database file path for a queue (`<base>/<queue_name>.db`).
    pub fn database_file(&self, queue_name: &str) -> PathBuf {
        self.base_dir.join(format!("{queue_name}.db"))
    }

    /// Returns the preference file path (`<base>/revflow-prefs.json`).
    pub fn preferences_file(&self) -> PathBuf {
        self.base_dir.join("revflow-prefs.json")
    }

    /// Ensures the base directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.base_dir)
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
