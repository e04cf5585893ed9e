//! Lazy storage adapter.
//!
//! # Responsibility
//! - Defer opening the backing store until the first operation needs it.
//! - Share one opened [`Database`] across all callers.
//!
//! # Invariants
//! - A successfully opened database is created exactly once per adapter.
//! - A failed open is not cached; the next access tries again.

use super::{Database, DbLocation, DbOptions, DbResult};
use log::warn;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// Lazily opened handle to the inventory store.
pub struct StorageAdapter {
    location: DbLocation,
    options: DbOptions,
    database: OnceCell<Arc<Database>>,
}

impl StorageAdapter {
    pub fn new(location: DbLocation, options: DbOptions) -> Self {
        Self {
            location,
            options,
            database: OnceCell::new(),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(DbLocation::Memory, DbOptions::default())
    }

    /// Returns the open database, creating the store on first use.
    pub fn database(&self) -> DbResult<Arc<Database>> {
        self.database
            .get_or_try_init(|| Database::open(&self.location, self.options).map(Arc::new))
            .cloned()
            .inspect_err(|err| {
                warn!("event=storage_open module=db status=error error={err}");
            })
    }

    /// Whether the backing store has been opened.
    pub fn is_open(&self) -> bool {
        self.database.get().is_some()
    }
}
