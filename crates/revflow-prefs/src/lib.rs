//! # RevFlow Preferences
//!
//! Host preference storage behind a small capability interface.
//!
//! The core never talks to platform user-defaults directly; it depends on
//! [`PreferenceStore`] so tests can inject [`MemoryPreferences`] and hosts can
//! supply whatever backing they have. [`FilePreferences`] is the default
//! file-backed implementation (a single JSON object, write-through).
//!
//! Identity state (anonymous id, user id) and persisted scheduler jobs both
//! live here, under the well-known keys in [`keys`].

mod file;
pub mod keys;
mod memory;

pub use file::FilePreferences;
pub use memory::MemoryPreferences;

use thiserror::Error;

/// Preference storage error type.
#[derive(Error, Debug)]
pub enum PrefsError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backing file is not a JSON object of strings
    #[error("malformed preference file: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type alias using PrefsError.
pub type PrefsResult<T> = Result<T, PrefsError>;

/// Trait for host preference backends.
///
/// Implementations must be safe for concurrent access from scheduler workers.
pub trait PreferenceStore: Send + Sync {
    /// Store a value under a key (upsert).
    fn set(&self, key: &str, value: &str) -> PrefsResult<()>;

    /// Retrieve a value.
    fn get(&self, key: &str) -> PrefsResult<Option<String>>;

    /// Delete a value. Returns true if the key existed.
    fn delete(&self, key: &str) -> PrefsResult<bool>;

    /// List all keys that start with a given prefix.
    fn keys_with_prefix(&self, prefix: &str) -> PrefsResult<Vec<String>>;

    /// Check if a key exists.
    fn has(&self, key: &str) -> PrefsResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}
