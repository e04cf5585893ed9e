//! Product schema definitions.
//!
//! # Responsibility
//! - Name the single `products` table and its columns.
//! - Define the enumerated product type codes and their validity predicate.
//! - Provide the canonical in-memory record for a fully read row.
//!
//! # Invariants
//! - Type codes persisted in storage are always one of `0`, `1`, `2`.
//! - `id` is engine-assigned and never written by callers.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Engine-assigned row identifier.
pub type ProductId = i64;

/// Authority used by product locators.
pub const CONTENT_AUTHORITY: &str = "com.example.android.inventoryapp2";
/// Collection path segment for products.
pub const PATH_PRODUCTS: &str = "products";
/// Name of the backing table.
pub const TABLE_NAME: &str = "products";

pub const COLUMN_ID: &str = "id";
pub const COLUMN_NAME: &str = "name";
pub const COLUMN_SUPPLIER: &str = "supplier";
pub const COLUMN_PHONE: &str = "phone";
pub const COLUMN_TYPE: &str = "type";
pub const COLUMN_QUANTITY: &str = "quantity";
pub const COLUMN_PRICE: &str = "price";

/// Type code for products without a known category.
pub const TYPE_UNKNOWN: i64 = 0;
/// Type code for groceries.
pub const TYPE_GROCERY: i64 = 1;
/// Type code for general goods.
pub const TYPE_GOODS: i64 = 2;

/// Returns whether `code` is one of the persisted product type codes.
pub fn is_valid_type(code: i64) -> bool {
    matches!(code, TYPE_UNKNOWN | TYPE_GROCERY | TYPE_GOODS)
}

/// Product category stored in the `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    #[default]
    Unknown,
    Grocery,
    Goods,
}

impl ProductType {
    /// Integer code persisted in storage.
    pub fn code(self) -> i64 {
        match self {
            Self::Unknown => TYPE_UNKNOWN,
            Self::Grocery => TYPE_GROCERY,
            Self::Goods => TYPE_GOODS,
        }
    }

    /// Decodes a persisted type code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            TYPE_UNKNOWN => Some(Self::Unknown),
            TYPE_GROCERY => Some(Self::Grocery),
            TYPE_GOODS => Some(Self::Goods),
            _ => None,
        }
    }

    /// Short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Grocery => "grocery",
            Self::Goods => "goods",
        }
    }
}

/// Typed handle for one column of the `products` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductColumn {
    Id,
    Name,
    Supplier,
    Phone,
    Type,
    Quantity,
    Price,
}

impl ProductColumn {
    /// All columns in table order. Used when a query asks for no projection.
    pub const ALL: [ProductColumn; 7] = [
        Self::Id,
        Self::Name,
        Self::Supplier,
        Self::Phone,
        Self::Type,
        Self::Quantity,
        Self::Price,
    ];

    /// Columns a caller must supply on insert.
    pub const WRITABLE: [ProductColumn; 6] = [
        Self::Name,
        Self::Supplier,
        Self::Phone,
        Self::Type,
        Self::Quantity,
        Self::Price,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => COLUMN_ID,
            Self::Name => COLUMN_NAME,
            Self::Supplier => COLUMN_SUPPLIER,
            Self::Phone => COLUMN_PHONE,
            Self::Type => COLUMN_TYPE,
            Self::Quantity => COLUMN_QUANTITY,
            Self::Price => COLUMN_PRICE,
        }
    }

    /// Parses a column name, case-insensitively and ignoring surrounding spaces.
    pub fn parse(value: &str) -> Result<Self, UnknownColumnError> {
        match value.trim().to_ascii_lowercase().as_str() {
            COLUMN_ID => Ok(Self::Id),
            COLUMN_NAME => Ok(Self::Name),
            COLUMN_SUPPLIER => Ok(Self::Supplier),
            COLUMN_PHONE => Ok(Self::Phone),
            COLUMN_TYPE => Ok(Self::Type),
            COLUMN_QUANTITY => Ok(Self::Quantity),
            COLUMN_PRICE => Ok(Self::Price),
            _ => Err(UnknownColumnError(value.to_string())),
        }
    }
}

impl Display for ProductColumn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column name that does not belong to the `products` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownColumnError(pub String);

impl Display for UnknownColumnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown product column `{}`", self.0)
    }
}

impl Error for UnknownColumnError {}

/// Fully materialized product row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub supplier: String,
    pub phone: String,
    /// Serialized as `type` to match the column name.
    #[serde(rename = "type")]
    pub kind: ProductType,
    pub quantity: i64,
    pub price: i64,
}

#[cfg(test)]
mod tests {
    use super::{is_valid_type, ProductColumn, ProductType};

    #[test]
    fn is_valid_type_accepts_only_known_codes() {
        for code in [0, 1, 2] {
            assert!(is_valid_type(code), "code {code} should be valid");
        }
        for code in [-1, 3, 9, i64::MIN, i64::MAX] {
            assert!(!is_valid_type(code), "code {code} should be invalid");
        }
    }

    #[test]
    fn product_type_codes_match_predicate() {
        for kind in [ProductType::Unknown, ProductType::Grocery, ProductType::Goods] {
            assert!(is_valid_type(kind.code()));
            assert_eq!(ProductType::from_code(kind.code()), Some(kind));
        }
        assert_eq!(ProductType::from_code(7), None);
        assert_eq!(ProductType::Grocery.label(), "grocery");
    }

    #[test]
    fn column_parse_is_case_insensitive() {
        assert_eq!(ProductColumn::parse(" Quantity ").unwrap(), ProductColumn::Quantity);
        assert!(ProductColumn::parse("weight").is_err());
    }

    #[test]
    fn writable_columns_exclude_id() {
        assert!(!ProductColumn::WRITABLE.contains(&ProductColumn::Id));
        assert_eq!(ProductColumn::ALL.len(), ProductColumn::WRITABLE.len() + 1);
    }
}
