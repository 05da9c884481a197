//! Durable key-value mirror used by the announcement store.
//!
//! # Responsibility
//! - Define a local-storage style contract (`get/set/remove` by string key).
//! - Provide in-memory and SQLite-backed implementations.
//!
//! # Invariants
//! - `set_item` replaces the whole value for a key; there are no partial writes.
//! - A failed `set_item` leaves the previous value readable.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod memory;
mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

/// Storage key holding the serialized announcement list.
pub const ANNOUNCEMENTS_KEY: &str = "announcements";

pub type StorageResult<T> = Result<T, StorageError>;

/// Local-storage style key-value contract.
pub trait DurableStorage {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_item(&self, key: &str) -> StorageResult<()>;
}

impl<S: DurableStorage + ?Sized> DurableStorage for &S {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        (**self).remove_item(key)
    }
}

/// Storage backend failures.
#[derive(Debug)]
pub enum StorageError {
    /// Write would exceed the configured byte quota.
    Quota {
        key: String,
        needed: usize,
        limit: usize,
    },
    /// Backend refuses access (disabled, read-only).
    Unavailable(String),
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Quota { key, needed, limit } => write!(
                f,
                "storage quota exceeded writing `{key}`: {needed} bytes needed, limit {limit}"
            ),
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Quota { .. } | Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
