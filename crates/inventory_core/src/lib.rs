//! Core data-access and validation layer for the inventory store.
//! This crate is the single source of truth for product invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod route;
pub mod service;

pub use config::{ConfigError, InventoryConfig};
pub use db::{Database, DbError, DbLocation, DbOptions, StorageAdapter};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::product::{is_valid_type, Product, ProductColumn, ProductId, ProductType};
pub use model::values::{FieldError, FieldErrorReason, ProductValues, Value};
pub use notify::{ChangeEvent, ChangeNotifier, Subscription};
pub use repo::product_repo::{
    Page, ProductPage, ProductQuery, ProductRepository, ProductRow, RepoError, RepoResult,
    Selection, SortDirection, SortKey, SortOrder, SqliteProductRepository,
};
pub use route::router::{ResourceRouter, Route};
pub use route::uri::{ContentUri, LocatorError};
pub use service::cursor::ProductCursor;
pub use service::product_service::{InsertOutcome, ProductService, ProviderError, ProviderResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
