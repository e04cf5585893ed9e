//! Record access service for products.
//!
//! # Responsibility
//! - Route locators, validate payloads and run insert/query/update/delete.
//! - Publish change notifications after successful mutations.
//!
//! # Invariants
//! - Locator and field errors are reported before storage is touched.
//! - Item locators always filter on their own id; caller selections are ignored.
//! - Each mutation is one transaction; notifications fire only after commit.
//! - Notifications are sent only when at least one row changed.

use crate::config::InventoryConfig;
use crate::db::{Database, DbError, StorageAdapter};
use crate::model::product::{Product, ProductColumn, ProductId};
use crate::model::values::{validate_values, FieldError, ProductValues, WriteMode};
use crate::notify::ChangeNotifier;
use crate::repo::product_repo::{
    ProductQuery, ProductRepository, RepoError, Selection, SortOrder, SqliteProductRepository,
};
use crate::route::router::{ResourceRouter, Route};
use crate::route::uri::{ContentUri, LocatorError};
use crate::service::cursor::ProductCursor;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Instant;

const DEFAULT_PAGE_SIZE: u32 = 64;

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Error surfaced by record access operations.
#[derive(Debug)]
pub enum ProviderError {
    /// Backing store could not be opened or created.
    StorageUnavailable(DbError),
    /// Locator does not match a recognized shape.
    InvalidLocator(LocatorError),
    /// A present field failed validation; nothing was written.
    InvalidField(FieldError),
    /// Operation is not defined for the locator's shape.
    UnsupportedOperation {
        operation: &'static str,
        uri: String,
    },
    /// A statement failed against an open store.
    Storage(RepoError),
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StorageUnavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::InvalidLocator(err) => write!(f, "{err}"),
            Self::InvalidField(err) => write!(f, "{err}"),
            Self::UnsupportedOperation { operation, uri } => {
                write!(f, "{operation} is not supported for {uri}")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProviderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::StorageUnavailable(err) => Some(err),
            Self::InvalidLocator(err) => Some(err),
            Self::InvalidField(err) => Some(err),
            Self::UnsupportedOperation { .. } => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<LocatorError> for ProviderError {
    fn from(value: LocatorError) -> Self {
        Self::InvalidLocator(value)
    }
}

impl From<FieldError> for ProviderError {
    fn from(value: FieldError) -> Self {
        Self::InvalidField(value)
    }
}

impl From<RepoError> for ProviderError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Result of an insert that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Row created; carries the new item locator.
    Created(ContentUri),
    /// The engine reported that no row was created.
    NoRowCreated,
}

impl InsertOutcome {
    pub fn uri(&self) -> Option<&ContentUri> {
        match self {
            Self::Created(uri) => Some(uri),
            Self::NoRowCreated => None,
        }
    }
}

/// Use-case service mediating every read and write of product rows.
pub struct ProductService {
    storage: Arc<StorageAdapter>,
    notifier: Arc<ChangeNotifier>,
    router: ResourceRouter,
    page_size: u32,
}

impl ProductService {
    /// Creates a service over an injected store, notifier and router.
    pub fn new(
        storage: Arc<StorageAdapter>,
        notifier: Arc<ChangeNotifier>,
        router: ResourceRouter,
    ) -> Self {
        Self {
            storage,
            notifier,
            router,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Wires storage, notifier and router from configuration.
    ///
    /// The store itself is opened lazily by the first operation.
    pub fn from_config(config: &InventoryConfig) -> Self {
        let storage = StorageAdapter::new(config.db_location(), config.db_options());
        Self::new(
            Arc::new(storage),
            Arc::new(ChangeNotifier::new(config.subscriber_capacity)),
            ResourceRouter::with_authority(config.authority.as_str()),
        )
        .with_page_size(config.cursor_page_size)
    }

    /// Sets how many rows each cursor fetch reads.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn router(&self) -> &ResourceRouter {
        &self.router
    }

    pub fn notifier(&self) -> &Arc<ChangeNotifier> {
        &self.notifier
    }

    /// Inserts one product through the collection locator.
    ///
    /// # Contract
    /// - Every writable column must be present and valid.
    /// - Returns `NoRowCreated` when the engine refuses the row.
    /// - Notifies the collection locator after commit.
    pub fn insert(
        &self,
        uri: &ContentUri,
        values: &ProductValues,
    ) -> ProviderResult<InsertOutcome> {
        let started_at = Instant::now();
        if let Route::Item(_) = self.router.route(uri)? {
            return Err(ProviderError::UnsupportedOperation {
                operation: "insert",
                uri: uri.to_uri_string(),
            });
        }
        let validated = validate_values(values, WriteMode::Insert)?;

        let database = self.database()?;
        let inserted =
            database.write(|tx| SqliteProductRepository::new(tx).insert_product(&validated))?;

        let Some(id) = inserted else {
            info!(
                "event=product_insert module=service status=no_row duration_ms={}",
                started_at.elapsed().as_millis()
            );
            return Ok(InsertOutcome::NoRowCreated);
        };

        self.notifier.notify(uri);
        info!(
            "event=product_insert module=service status=ok id={id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(InsertOutcome::Created(self.router.item_uri(id)))
    }

    /// Queries rows behind a locator.
    ///
    /// # Contract
    /// - Empty `projection` selects every column.
    /// - Item locators replace `selection` with their own id.
    /// - The returned cursor is subscribed to changes of `uri`.
    pub fn query(
        &self,
        uri: &ContentUri,
        projection: &[ProductColumn],
        selection: Selection,
        sort: SortOrder,
    ) -> ProviderResult<ProductCursor> {
        let selection = self.effective_selection(uri, selection)?;
        let database = self.database()?;
        let query = ProductQuery {
            projection: projection.to_vec(),
            selection,
            sort,
        };

        let subscription = self.notifier.subscribe(uri);
        let cursor = ProductCursor::open(database, query, self.page_size, subscription)?;
        debug!("event=product_query module=service status=ok");
        Ok(cursor)
    }

    /// Updates present fields on rows behind a locator.
    ///
    /// # Contract
    /// - Validates every present field first; any failure writes nothing.
    /// - An empty payload is a no-op returning `0`.
    /// - Notifies `uri` when at least one row changed.
    pub fn update(
        &self,
        uri: &ContentUri,
        values: &ProductValues,
        selection: Selection,
    ) -> ProviderResult<usize> {
        let started_at = Instant::now();
        let selection = self.effective_selection(uri, selection)?;
        let validated = validate_values(values, WriteMode::Update)?;
        if validated.is_empty() {
            debug!("event=product_update module=service status=noop reason=empty_values");
            return Ok(0);
        }

        let database = self.database()?;
        let updated = database
            .write(|tx| SqliteProductRepository::new(tx).update_products(&validated, &selection))?;

        if updated > 0 {
            self.notifier.notify(uri);
        }
        info!(
            "event=product_update module=service status=ok rows={updated} fields={} duration_ms={}",
            validated.len(),
            started_at.elapsed().as_millis()
        );
        Ok(updated)
    }

    /// Deletes rows behind a locator.
    ///
    /// # Contract
    /// - No validation; nothing is written besides the removal.
    /// - Notifies `uri` only when at least one row was removed.
    pub fn delete(&self, uri: &ContentUri, selection: Selection) -> ProviderResult<usize> {
        let started_at = Instant::now();
        let selection = self.effective_selection(uri, selection)?;

        let database = self.database()?;
        let deleted =
            database.write(|tx| SqliteProductRepository::new(tx).delete_products(&selection))?;

        if deleted > 0 {
            self.notifier.notify(uri);
        }
        info!(
            "event=product_delete module=service status=ok rows={deleted} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(deleted)
    }

    /// Returns the collection-kind or item-kind descriptor for a locator.
    pub fn type_of(&self, uri: &ContentUri) -> ProviderResult<&str> {
        Ok(self.router.type_of(uri)?)
    }

    /// Reads one full product by id.
    pub fn get(&self, id: ProductId) -> ProviderResult<Option<Product>> {
        let cursor = self.query(
            &self.router.item_uri(id),
            &[],
            Selection::all(),
            SortOrder::new(),
        )?;
        Ok(cursor.collect_products()?.into_iter().next())
    }

    /// Counts rows matching `selection` across the collection.
    pub fn count(&self, selection: &Selection) -> ProviderResult<u64> {
        let database = self.database()?;
        Ok(database.read(|conn| SqliteProductRepository::new(conn).count_products(selection))?)
    }

    fn effective_selection(
        &self,
        uri: &ContentUri,
        selection: Selection,
    ) -> ProviderResult<Selection> {
        match self.router.route(uri)? {
            Route::Collection => Ok(selection),
            Route::Item(id) => Ok(Selection::by_id(id)),
        }
    }

    fn database(&self) -> ProviderResult<Arc<Database>> {
        self.storage
            .database()
            .map_err(ProviderError::StorageUnavailable)
    }
}
