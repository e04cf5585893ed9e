//! Inventory store configuration.
//!
//! # Responsibility
//! - Describe where the store lives and how the core is tuned.
//! - Load settings from an optional TOML file with defaults for every field.
//!
//! # Invariants
//! - A missing config file yields defaults, never an error.
//! - Loaded configs are validated before use.

use crate::db::{DbLocation, DbOptions};
use crate::model::product::CONTENT_AUTHORITY;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file name, resolved relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "inventory.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InventoryConfig {
    /// Locator authority served by this store.
    pub authority: String,
    /// Database file path, or `:memory:`.
    pub database: String,
    pub busy_timeout_ms: u64,
    /// Rows fetched per cursor page.
    pub cursor_page_size: u32,
    /// Pending notifications buffered per subscriber.
    pub subscriber_capacity: usize,
    pub reader_pool_size: usize,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        let db = DbOptions::default();
        Self {
            authority: CONTENT_AUTHORITY.to_string(),
            database: DbLocation::MEMORY_SENTINEL.to_string(),
            busy_timeout_ms: u64::try_from(db.busy_timeout.as_millis()).unwrap_or(u64::MAX),
            cursor_page_size: 64,
            subscriber_capacity: 16,
            reader_pool_size: db.reader_pool_size,
        }
    }
}

impl InventoryConfig {
    /// Loads config from `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::from_toml_str(&contents).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Parses and validates config from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.authority.trim().is_empty() {
            return Err(ConfigError::Invalid("authority cannot be empty".to_string()));
        }
        if self.database.trim().is_empty() {
            return Err(ConfigError::Invalid("database cannot be empty".to_string()));
        }
        if self.cursor_page_size == 0 {
            return Err(ConfigError::Invalid(
                "cursor_page_size must be greater than zero".to_string(),
            ));
        }
        if self.subscriber_capacity == 0 {
            return Err(ConfigError::Invalid(
                "subscriber_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_location(&self) -> DbLocation {
        DbLocation::parse(&self.database)
    }

    pub fn db_options(&self) -> DbOptions {
        DbOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
            reader_pool_size: self.reader_pool_size,
        }
    }
}
