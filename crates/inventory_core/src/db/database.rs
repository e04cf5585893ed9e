//! Shared database handle with serialized writes and pooled reads.
//!
//! # Responsibility
//! - Own the single writer connection and hand it out one transaction at a time.
//! - Hand out read-only connections for file stores so reads run concurrently.
//!
//! # Invariants
//! - Every write closure runs inside one `IMMEDIATE` transaction; it commits
//!   only when the closure returns `Ok`.
//! - Readers never observe uncommitted writes (read-committed under WAL).
//! - In-memory stores route reads through the writer connection.

use super::open::{open_file_reader, open_file_writer, open_memory_writer, DEFAULT_BUSY_TIMEOUT};
use super::{DbError, DbLocation, DbResult};
use log::debug;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

const DEFAULT_READER_POOL_SIZE: usize = 4;

/// Tuning knobs for opening a [`Database`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbOptions {
    pub busy_timeout: Duration,
    /// Maximum number of idle reader connections kept for reuse.
    pub reader_pool_size: usize,
}

impl Default for DbOptions {
    fn default() -> Self {
        Self {
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            reader_pool_size: DEFAULT_READER_POOL_SIZE,
        }
    }
}

/// Open, migrated inventory database.
pub struct Database {
    reader_path: Option<PathBuf>,
    options: DbOptions,
    writer: Mutex<Connection>,
    idle_readers: Mutex<Vec<Connection>>,
}

impl Database {
    /// Opens (creating if needed) the store at `location` and applies migrations.
    ///
    /// Opening an existing store never alters its rows.
    pub fn open(location: &DbLocation, options: DbOptions) -> DbResult<Self> {
        let (writer, reader_path) = match location {
            DbLocation::Memory => (open_memory_writer(options.busy_timeout)?, None),
            DbLocation::File(path) => (
                open_file_writer(path, options.busy_timeout)?,
                Some(path.clone()),
            ),
        };
        debug!(
            "event=db_ready module=db status=ok mode={} reader_pool_size={}",
            location.mode(),
            options.reader_pool_size
        );

        Ok(Self {
            reader_path,
            options,
            writer: Mutex::new(writer),
            idle_readers: Mutex::new(Vec::new()),
        })
    }

    /// Runs `f` inside one write transaction.
    ///
    /// Callers block while another write is in flight. The transaction is
    /// rolled back when `f` fails.
    pub fn write<T, E>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let mut conn = lock(&self.writer);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(DbError::from)?;
        let value = f(&tx)?;
        tx.commit().map_err(DbError::from)?;
        Ok(value)
    }

    /// Runs `f` against a read-capable connection.
    pub fn read<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<DbError>,
    {
        let Some(path) = self.reader_path.as_ref() else {
            let conn = lock(&self.writer);
            return f(&conn);
        };

        let conn = match lock(&self.idle_readers).pop() {
            Some(conn) => conn,
            None => open_file_reader(path, self.options.busy_timeout)?,
        };
        let result = f(&conn);

        let mut idle = lock(&self.idle_readers);
        if idle.len() < self.options.reader_pool_size {
            idle.push(conn);
        }
        result
    }

    /// Number of idle reader connections currently pooled.
    pub fn idle_reader_count(&self) -> usize {
        lock(&self.idle_readers).len()
    }
}

// A panic inside a closure leaves the connection usable: the open
// transaction is rolled back when it is dropped during unwinding.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
