//! Well-known preference keys.

/// Key for the persisted anonymous id string.
pub const ANONYMOUS_ID_KEY: &str = "__revflowAnonymousId";

/// Key for the persisted user id string.
pub const USER_ID_KEY: &str = "__revflowUserId";

/// Prefix under which persisted scheduler jobs are stored.
///
/// Entries live at `revflow.jobs.<queue>.<uuid>`; the per-queue insertion
/// order index lives at `revflow.jobs.<queue>.__index`.
pub const JOBS_KEY_PREFIX: &str = "revflow.jobs";
