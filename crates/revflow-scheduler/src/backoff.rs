//! Exponential backoff computation.

use std::time::Duration;

/// Backoff growth is capped here no matter the retry count.
pub const BACKOFF_MAX: Duration = Duration::from_secs(3600);

/// Computes the delay before retry number `attempt` (1-based).
///
/// Implements binary exponential backoff: `initial * 2^(attempt - 1)`,
/// saturating, capped at [`BACKOFF_MAX`].
pub fn compute_backoff(initial: Duration, attempt: u32) -> Duration {
    let initial_ms = initial.as_millis() as u64;
    let max_ms = BACKOFF_MAX.as_millis() as u64;

    let shift = attempt.saturating_sub(1);
    let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
    let delay_ms = initial_ms.saturating_mul(multiplier).min(max_ms);

    Duration::from_millis(delay_ms)
}
