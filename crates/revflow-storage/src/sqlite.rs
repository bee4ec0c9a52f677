//! SQLite-backed message storage.
//!
//! One database file per queue name, single `messages` table. Arrival order
//! is captured by a `created_at` julian-day column assigned by SQLite at
//! insert time; all reads order by it.

use crate::{MessageStorage, StorageError, StorageResult};
use revflow_events::{Message, MessageType};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Durable SQLite implementation of [`MessageStorage`].
///
/// The connection is owned exclusively by this instance and serialized behind
/// a mutex, so concurrent callers see per-call atomicity and a total order.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

/// A fetched row before JSON columns are decoded.
struct MessageRow {
    id: String,
    message_type: String,
    user_id: Option<String>,
    anonymous_id: Option<String>,
    timestamp: f64,
    api_version: String,
    event: Option<String>,
    properties: Option<String>,
    traits: Option<String>,
    context: String,
}

impl SqliteStorage {
    /// Opens a database at the given path, creating it and the schema if
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = 5000;
        ",
        )?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;

        debug!(path = %path.display(), "Opened message database");
        Ok(storage)
    }

    /// Opens an in-memory database for testing.
    pub fn in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn init_schema(&self) -> StorageResult<()> {
        self.conn.lock().expect("lock poisoned").execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                type TEXT NOT NULL,
                user_id TEXT,
                anonymous_id TEXT,
                timestamp REAL NOT NULL,
                api_version TEXT NOT NULL,
                event TEXT,
                properties TEXT,
                traits TEXT,
                context TEXT NOT NULL,
                created_at REAL NOT NULL DEFAULT (julianday('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_messages_created_at ON messages(created_at);
            "#,
        )?;
        Ok(())
    }

    fn row_to_message(row: MessageRow) -> StorageResult<Message> {
        let message_type = MessageType::from_str(&row.message_type)
            .ok_or_else(|| StorageError::Decode(format!("unknown type '{}'", row.message_type)))?;

        let millis = (row.timestamp * 1000.0).round() as i64;
        let timestamp = chrono::DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StorageError::Decode(format!("bad timestamp {}", row.timestamp)))?;

        Ok(Message {
            id: row.id,
            message_type,
            user_id: row.user_id,
            anonymous_id: row.anonymous_id,
            timestamp,
            api_version: row.api_version,
            event: row.event,
            properties: row.properties.as_deref().map(serde_json::from_str).transpose()?,
            traits: row.traits.as_deref().map(serde_json::from_str).transpose()?,
            context: serde_json::from_str(&row.context)?,
        })
    }
}

impl MessageStorage for SqliteStorage {
    fn store(&self, message: &Message) -> StorageResult<()> {
        let properties = message
            .properties
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let traits = message.traits.as_ref().map(serde_json::to_string).transpose()?;
        let context = serde_json::to_string(&message.context)?;
        let timestamp = message.timestamp.timestamp_millis() as f64 / 1000.0;

        self.conn.lock().expect("lock poisoned").execute(
            "INSERT INTO messages (id, type, user_id, anonymous_id, timestamp, api_version, event, properties, traits, context)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                message.id,
                message.message_type.as_str(),
                message.user_id,
                message.anonymous_id,
                timestamp,
                message.api_version,
                message.event,
                properties,
                traits,
                context,
            ],
        )?;
        Ok(())
    }

    fn fetch(&self, limit: usize) -> StorageResult<Vec<Message>> {
        let conn = self.conn.lock().expect("lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, type, user_id, anonymous_id, timestamp, api_version, event, properties, traits, context
             FROM messages ORDER BY created_at ASC, rowid ASC LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(MessageRow {
                    id: row.get(0)?,
                    message_type: row.get(1)?,
                    user_id: row.get(2)?,
                    anonymous_id: row.get(3)?,
                    timestamp: row.get(4)?,
                    api_version: row.get(5)?,
                    event: row.get(6)?,
                    properties: row.get(7)?,
                    traits: row.get(8)?,
                    context: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(Self::row_to_message).collect()
    }

    fn delete(&self, ids: &[String]) -> StorageResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock().expect("lock poisoned");
        let tx = conn.transaction()?;
        for id in ids {
            tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn size(&self) -> StorageResult<usize> {
        let count: i64 = self.conn.lock().expect("lock poisoned").query_row(
            "SELECT COUNT(*) FROM messages",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn clear(&self) -> StorageResult<()> {
        self.conn
            .lock()
            .expect("lock poisoned")
            .execute("DELETE FROM messages", [])?;
        Ok(())
    }
}
