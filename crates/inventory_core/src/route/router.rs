//! Locator classification for the products collection.
//!
//! # Responsibility
//! - Classify a locator as the whole collection or one item.
//! - Extract item ids through a typed parse, never by trusting raw text.
//! - Describe locators with collection/item kind strings.
//!
//! # Invariants
//! - Only `<authority>/<collection>` and `<authority>/<collection>/<id>` route.
//! - Item ids are positive decimal integers.

use crate::model::product::{ProductId, CONTENT_AUTHORITY, PATH_PRODUCTS};
use crate::route::uri::{ContentUri, LocatorError};

const CURSOR_DIR_BASE_TYPE: &str = "vnd.android.cursor.dir";
const CURSOR_ITEM_BASE_TYPE: &str = "vnd.android.cursor.item";

/// Classified operation target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Whole table, optionally narrowed by a caller selection.
    Collection,
    /// Exactly one row.
    Item(ProductId),
}

/// Maps locators onto [`Route`]s for one authority/collection pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRouter {
    authority: String,
    collection: String,
    collection_kind: String,
    item_kind: String,
}

impl ResourceRouter {
    pub fn new(authority: impl Into<String>, collection: impl Into<String>) -> Self {
        let authority = authority.into();
        let collection = collection.into();
        let collection_kind = format!("{CURSOR_DIR_BASE_TYPE}/{authority}/{collection}");
        let item_kind = format!("{CURSOR_ITEM_BASE_TYPE}/{authority}/{collection}");
        Self {
            authority,
            collection,
            collection_kind,
            item_kind,
        }
    }

    /// Router for the default products authority.
    pub fn products() -> Self {
        Self::new(CONTENT_AUTHORITY, PATH_PRODUCTS)
    }

    /// Router for products under a custom authority.
    pub fn with_authority(authority: impl Into<String>) -> Self {
        Self::new(authority, PATH_PRODUCTS)
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Classifies a parsed locator.
    ///
    /// # Errors
    /// - `UnknownAuthority` when the authority differs.
    /// - `UnknownPath` when the path is neither the collection nor an item.
    /// - `InvalidId` when the item segment is not a positive integer.
    pub fn route(&self, uri: &ContentUri) -> Result<Route, LocatorError> {
        if uri.authority() != self.authority {
            return Err(LocatorError::UnknownAuthority(uri.authority().to_string()));
        }

        match uri.segments() {
            [collection] if *collection == self.collection => Ok(Route::Collection),
            [collection, id] if *collection == self.collection => {
                parse_item_id(id).map(Route::Item)
            }
            _ => Err(LocatorError::UnknownPath(uri.to_uri_string())),
        }
    }

    /// Parses and classifies a locator string.
    pub fn route_str(&self, value: &str) -> Result<(ContentUri, Route), LocatorError> {
        let uri = ContentUri::parse(value)?;
        let route = self.route(&uri)?;
        Ok((uri, route))
    }

    pub fn collection_uri(&self) -> ContentUri {
        ContentUri::new(self.authority.as_str(), [self.collection.as_str()])
    }

    pub fn item_uri(&self, id: ProductId) -> ContentUri {
        self.collection_uri().join(id.to_string())
    }

    /// Returns the collection-kind or item-kind descriptor for a locator.
    pub fn type_of(&self, uri: &ContentUri) -> Result<&str, LocatorError> {
        match self.route(uri)? {
            Route::Collection => Ok(self.collection_kind.as_str()),
            Route::Item(_) => Ok(self.item_kind.as_str()),
        }
    }
}

impl Default for ResourceRouter {
    fn default() -> Self {
        Self::products()
    }
}

/// Parses the trailing item segment of a locator.
///
/// Accepts only ASCII digits without sign, and rejects zero and overflow.
pub fn parse_item_id(segment: &str) -> Result<ProductId, LocatorError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(LocatorError::InvalidId(segment.to_string()));
    }
    match segment.parse::<ProductId>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(LocatorError::InvalidId(segment.to_string())),
    }
}
