//! SDK configuration.

use crate::{ConfigResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default delivery endpoint.
pub const DEFAULT_SERVER_URL: &str = "https://cdp-api.revflow.dev";

/// Default batch timer window in seconds.
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;

/// Default count threshold for batching.
pub const DEFAULT_FLUSH_QUEUE_SIZE: usize = 20;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Persistent SDK configuration.
///
/// Loaded from `config.json` under the base directory, with `REVFLOW_*`
/// environment overrides for the keys that make sense at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Workspace write key, sent as the `X-API-Key` header.
    pub api_key: String,
    /// Delivery base URL.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Batch timer window in seconds.
    #[serde(default = "default_flush_interval")]
    pub flush_interval: u64,
    /// Count threshold that triggers an immediate drain.
    #[serde(default = "default_flush_queue_size")]
    pub flush_queue_size: usize,
    /// When false, every message is delivered individually.
    #[serde(default = "default_true")]
    pub use_batch: bool,
    /// When true, all emits are dropped silently.
    #[serde(default)]
    pub opt_out: bool,
    /// When true, a final drain runs on shutdown.
    #[serde(default = "default_true")]
    pub flush_events_on_close: bool,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_flush_interval() -> u64 {
    DEFAULT_FLUSH_INTERVAL_SECS
}

fn default_flush_queue_size() -> usize {
    DEFAULT_FLUSH_QUEUE_SIZE
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Config {
    /// Creates a config with the given API key and defaults for everything
    /// else.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server_url: default_server_url(),
            flush_interval: DEFAULT_FLUSH_INTERVAL_SECS,
            flush_queue_size: DEFAULT_FLUSH_QUEUE_SIZE,
            use_batch: true,
            opt_out: false,
            flush_events_on_close: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Loads configuration from the config file, falling back to defaults,
    /// then applies environment overrides.
    pub fn load(paths: &Paths, api_key: impl Into<String>) -> ConfigResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::new(api_key)
        };

        config.load_from_env();
        Ok(config)
    }

    /// Loads configuration from a specific file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to the config file.
    pub fn save(&self, paths: &Paths) -> ConfigResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Applies `REVFLOW_*` environment overrides.
    fn load_from_env(&mut self) {
        if let Ok(level) = std::env::var("REVFLOW_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(url) = std::env::var("REVFLOW_SERVER_URL") {
            if !url.trim().is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(raw) = std::env::var("REVFLOW_OPT_OUT") {
            self.opt_out = raw == "1" || raw.eq_ignore_ascii_case("true");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_uses_defaults() {
        let config = Config::new("write-key");
        assert_eq!(config.api_key, "write-key");
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.flush_interval, 30);
        assert_eq!(config.flush_queue_size, 20);
        assert!(config.use_batch);
        assert!(!config.opt_out);
        assert!(config.flush_events_on_close);
    }

    #[test]
    fn serializes_camel_case_keys() {
        let config = Config::new("k");
        let value = serde_json::to_value(&config).unwrap();
        assert!(value.get("apiKey").is_some());
        assert!(value.get("serverUrl").is_some());
        assert!(value.get("flushInterval").is_some());
        assert!(value.get("flushQueueSize").is_some());
        assert!(value.get("useBatch").is_some());
        assert!(value.get("optOut").is_some());
        assert!(value.get("flushEventsOnClose").is_some());
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"apiKey": "k"}"#).unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.flush_queue_size, DEFAULT_FLUSH_QUEUE_SIZE);
        assert!(config.use_batch);
        assert!(!config.opt_out);
    }

    #[test]
    fn save_and_load_round_trips() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::new("k");
        config.flush_queue_size = 5;
        config.use_batch = false;
        config.save(&paths).unwrap();

        let loaded = Config::load(&paths, "ignored-key").unwrap();
        assert_eq!(loaded.api_key, "k");
        assert_eq!(loaded.flush_queue_size, 5);
        assert!(!loaded.use_batch);
    }
}
