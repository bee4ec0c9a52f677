//! Queue configuration.

use revflow_config::Config;
use std::time::Duration;

/// Fetch limit used when no batching window is configured.
pub const DEFAULT_FETCH_LIMIT: usize = 100;

/// Count-and-time batching configuration.
///
/// A drain is triggered by whichever fires first: the stored count reaching
/// `max_count`, or the periodic timer at `time_window`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchingWindow {
    /// Period of the batch timer.
    pub time_window: Duration,
    /// Count threshold that triggers an immediate drain.
    pub max_count: usize,
}

/// Options for a message queue.
///
/// Without a batching window every emit triggers immediate processing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueOptions {
    pub batching_window: Option<BatchingWindow>,
}

impl QueueOptions {
    /// Options with no batching window: per-emit delivery.
    pub fn immediate() -> Self {
        Self {
            batching_window: None,
        }
    }

    /// Options with a count-and-time batching window.
    pub fn windowed(time_window: Duration, max_count: usize) -> Self {
        Self {
            batching_window: Some(BatchingWindow {
                time_window,
                max_count,
            }),
        }
    }

    /// Maps SDK configuration onto queue options.
    ///
    /// `useBatch = false` forces immediate per-message delivery regardless of
    /// the flush settings.
    pub fn from_config(config: &Config) -> Self {
        if config.use_batch {
            Self::windowed(
                Duration::from_secs(config.flush_interval),
                config.flush_queue_size,
            )
        } else {
            Self::immediate()
        }
    }
}
