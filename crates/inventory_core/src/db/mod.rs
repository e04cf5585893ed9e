//! SQLite storage bootstrap and connection handout.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the inventory store.
//! - Apply schema migrations in deterministic order.
//! - Hand out serialized write access and concurrent read access.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write product rows before migrations succeed.
//! - At most one write transaction is in flight per `Database`.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod adapter;
mod database;
pub mod migrations;
mod open;

pub use adapter::StorageAdapter;
pub use database::{Database, DbOptions};
pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "database schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Where the backing store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// Private in-memory database; gone when the `Database` is dropped.
    Memory,
    /// Database file, created on first open.
    File(PathBuf),
}

impl DbLocation {
    /// Sentinel accepted in configuration for an in-memory store.
    pub const MEMORY_SENTINEL: &'static str = ":memory:";

    /// Parses a configured location; `:memory:` selects an in-memory store.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed == Self::MEMORY_SENTINEL {
            Self::Memory
        } else {
            Self::File(PathBuf::from(trimmed))
        }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    fn mode(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File(_) => "file",
        }
    }
}
