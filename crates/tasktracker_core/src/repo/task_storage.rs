//! Durable storage port for the serialized task list.
//!
//! # Responsibility
//! - Load and overwrite one opaque blob holding the whole task list.
//! - Keep SQLite details out of store orchestration.
//!
//! # Invariants
//! - `load_raw` never fails: unreadable data is reported as `None`.
//! - `save_raw` replaces the previous blob in a single statement.

use crate::db::DbError;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use std::cell::{Cell, RefCell};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key under which the task list blob is stored.
pub const TASKS_KEY: &str = "tasks";

#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "task storage write failed: {err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage interface for the serialized task list.
pub trait TaskStorage {
    /// Last saved blob, or `None` when never saved or unreadable.
    fn load_raw(&self) -> Option<Vec<u8>>;
    /// Overwrites the saved blob.
    fn save_raw(&self, bytes: &[u8]) -> Result<(), StorageError>;
}

/// SQLite key-value backed storage.
///
/// The connection must come from `db::open_db*` so the schema exists.
pub struct SqliteTaskStorage {
    conn: Connection,
    key: String,
}

impl SqliteTaskStorage {
    pub fn new(conn: Connection) -> Self {
        Self::with_key(conn, TASKS_KEY)
    }

    /// Uses a custom key, allowing several lists in one database.
    pub fn with_key(conn: Connection, key: impl Into<String>) -> Self {
        Self {
            conn,
            key: key.into(),
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl TaskStorage for SqliteTaskStorage {
    fn load_raw(&self) -> Option<Vec<u8>> {
        let result = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [self.key.as_str()],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional();

        match result {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    "event=storage_load module=repo status=error key={} error={}",
                    self.key, err
                );
                None
            }
        }
    }

    fn save_raw(&self, bytes: &[u8]) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![self.key.as_str(), bytes],
        )?;
        Ok(())
    }
}

/// In-process storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryTaskStorage {
    blob: RefCell<Option<Vec<u8>>>,
    saves: Cell<usize>,
}

impl MemoryTaskStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with an arbitrary blob.
    pub fn with_raw(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            blob: RefCell::new(Some(bytes.into())),
            saves: Cell::new(0),
        }
    }

    /// Current blob contents.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.blob.borrow().clone()
    }

    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl TaskStorage for MemoryTaskStorage {
    fn load_raw(&self) -> Option<Vec<u8>> {
        self.raw()
    }

    fn save_raw(&self, bytes: &[u8]) -> Result<(), StorageError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}
