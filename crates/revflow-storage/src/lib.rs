//! # RevFlow Storage
//!
//! Durable FIFO message log behind the [`MessageStorage`] trait.
//!
//! ## Non-negotiable Principles
//!
//! - SQLite is the durable store; the memory backend is an availability
//!   fallback, not an alternative of equal standing
//! - Insertion order is total and preserved on fetch
//! - `fetch` never consumes; consumption is an explicit `delete` by id
//! - Every instance serializes its own operations
//!
//! ## Backends
//!
//! - [`SqliteStorage`] - one database file per queue, survives restarts
//! - [`MemoryStorage`] - in-process fallback used when the database cannot
//!   be opened; contents do not survive restarts

mod error;
mod memory;
mod sqlite;

#[cfg(test)]
mod tests;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

use revflow_events::Message;

/// A FIFO durable log of messages.
///
/// Implementations serialize all operations internally: concurrent callers
/// observe a total order equal to their acceptance order.
pub trait MessageStorage: Send + Sync {
    /// Append a message, preserving arrival order.
    fn store(&self, message: &Message) -> StorageResult<()>;

    /// Return the oldest `limit` messages in FIFO order.
    ///
    /// Non-destructive: a later [`delete`](MessageStorage::delete) is
    /// required to consume.
    fn fetch(&self, limit: usize) -> StorageResult<Vec<Message>>;

    /// Remove messages by id. Missing ids are ignored; an empty input is a
    /// no-op. All-or-nothing per call.
    fn delete(&self, ids: &[String]) -> StorageResult<()>;

    /// Count of stored messages.
    fn size(&self) -> StorageResult<usize>;

    /// Remove all messages.
    fn clear(&self) -> StorageResult<()>;
}
