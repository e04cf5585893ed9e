//! Write payloads and field validation for product records.
//!
//! # Responsibility
//! - Carry the loosely typed column/value bag callers submit on insert/update.
//! - Validate present fields and normalize them into bindable values.
//!
//! # Invariants
//! - Absent fields are never checked and never written.
//! - A single invalid field rejects the whole payload; nothing is partially
//!   normalized for writing.
//! - `id` can never be written through a payload.

use crate::model::product::{is_valid_type, ProductColumn, ProductType};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Dynamically typed value for one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<ProductType> for Value {
    fn from(value: ProductType) -> Self {
        Self::Integer(value.code())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Column/value bag submitted by callers for insert and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductValues {
    entries: BTreeMap<ProductColumn, Value>,
}

impl ProductValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a complete insert payload from typed fields.
    pub fn for_product(
        name: impl Into<String>,
        supplier: impl Into<String>,
        phone: impl Into<String>,
        kind: ProductType,
        quantity: i64,
        price: i64,
    ) -> Self {
        Self::new()
            .with(ProductColumn::Name, name.into())
            .with(ProductColumn::Supplier, supplier.into())
            .with(ProductColumn::Phone, phone.into())
            .with(ProductColumn::Type, kind)
            .with(ProductColumn::Quantity, quantity)
            .with(ProductColumn::Price, price)
    }

    /// Sets one column, replacing any previous value.
    pub fn put(&mut self, column: ProductColumn, value: impl Into<Value>) -> &mut Self {
        self.entries.insert(column, value.into());
        self
    }

    /// Builder-style variant of [`ProductValues::put`].
    pub fn with(mut self, column: ProductColumn, value: impl Into<Value>) -> Self {
        self.put(column, value);
        self
    }

    /// Marks a column as present with an explicit null.
    pub fn put_null(&mut self, column: ProductColumn) -> &mut Self {
        self.entries.insert(column, Value::Null);
        self
    }

    pub fn remove(&mut self, column: ProductColumn) -> Option<Value> {
        self.entries.remove(&column)
    }

    pub fn contains(&self, column: ProductColumn) -> bool {
        self.entries.contains_key(&column)
    }

    pub fn get(&self, column: ProductColumn) -> Option<&Value> {
        self.entries.get(&column)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ProductColumn, &Value)> {
        self.entries.iter().map(|(column, value)| (*column, value))
    }
}

/// Which write path a payload is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Every writable column must be present.
    Insert,
    /// Only present columns are checked.
    Update,
}

/// Reason a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldErrorReason {
    /// Column missing from an insert payload.
    Required,
    /// Column present with a null value where null is not allowed.
    Null,
    /// Type code outside the known set.
    InvalidType(i64),
    /// Quantity or price below zero.
    Negative(i64),
    /// Text that should have been an integer.
    NotAnInteger(String),
    /// Engine-assigned column supplied by the caller.
    Immutable,
}

/// Validation failure for one field of a write payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: ProductColumn,
    pub reason: FieldErrorReason,
}

impl FieldError {
    fn new(field: ProductColumn, reason: FieldErrorReason) -> Self {
        Self { field, reason }
    }
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let field = self.field;
        match &self.reason {
            FieldErrorReason::Required => write!(f, "product requires `{field}`"),
            FieldErrorReason::Null => write!(f, "product `{field}` must not be null"),
            FieldErrorReason::InvalidType(code) => {
                write!(f, "product requires valid type, got `{code}`")
            }
            FieldErrorReason::Negative(value) => {
                write!(f, "product requires valid {field}, got `{value}`")
            }
            FieldErrorReason::NotAnInteger(value) => {
                write!(f, "product `{field}` must be an integer, got `{value}`")
            }
            FieldErrorReason::Immutable => write!(f, "product `{field}` is assigned by storage"),
        }
    }
}

impl Error for FieldError {}

/// Normalized, validated column values ready for binding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedValues {
    columns: Vec<(ProductColumn, Value)>,
}

impl ValidatedValues {
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ProductColumn, Value)> {
        self.columns.iter()
    }
}

/// Validates present fields and normalizes them for the given write path.
///
/// Checks run in column order: name, supplier, phone, type, quantity, price.
/// The first failing field is reported.
///
/// # Errors
/// - `Required` when an insert payload lacks a writable column.
/// - `Immutable` when the payload carries `id`.
/// - `Null`, `InvalidType`, `Negative`, `NotAnInteger` per column rules.
pub fn validate_values(
    values: &ProductValues,
    mode: WriteMode,
) -> Result<ValidatedValues, FieldError> {
    if values.contains(ProductColumn::Id) {
        return Err(FieldError::new(ProductColumn::Id, FieldErrorReason::Immutable));
    }

    let mut columns = Vec::with_capacity(values.len());
    for column in ProductColumn::WRITABLE {
        let Some(value) = values.get(column) else {
            if mode == WriteMode::Insert {
                return Err(FieldError::new(column, FieldErrorReason::Required));
            }
            continue;
        };

        columns.push((column, normalize_column(column, value)?));
    }

    Ok(ValidatedValues { columns })
}

fn normalize_column(column: ProductColumn, value: &Value) -> Result<Value, FieldError> {
    match column {
        ProductColumn::Name | ProductColumn::Supplier | ProductColumn::Phone => {
            normalize_required_text(column, value)
        }
        ProductColumn::Type => normalize_type(value),
        ProductColumn::Quantity | ProductColumn::Price => normalize_non_negative(column, value),
        ProductColumn::Id => Err(FieldError::new(column, FieldErrorReason::Immutable)),
    }
}

fn normalize_required_text(column: ProductColumn, value: &Value) -> Result<Value, FieldError> {
    match value {
        Value::Null => Err(FieldError::new(column, FieldErrorReason::Null)),
        Value::Text(text) => Ok(Value::Text(text.clone())),
        Value::Integer(number) => Ok(Value::Text(number.to_string())),
    }
}

fn normalize_type(value: &Value) -> Result<Value, FieldError> {
    let code = match value {
        Value::Null => {
            return Err(FieldError::new(ProductColumn::Type, FieldErrorReason::Null));
        }
        other => coerce_integer(ProductColumn::Type, other)?,
    };
    if !is_valid_type(code) {
        return Err(FieldError::new(
            ProductColumn::Type,
            FieldErrorReason::InvalidType(code),
        ));
    }
    Ok(Value::Integer(code))
}

fn normalize_non_negative(column: ProductColumn, value: &Value) -> Result<Value, FieldError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let number = coerce_integer(column, value)?;
    if number < 0 {
        return Err(FieldError::new(column, FieldErrorReason::Negative(number)));
    }
    Ok(Value::Integer(number))
}

fn coerce_integer(column: ProductColumn, value: &Value) -> Result<i64, FieldError> {
    match value {
        Value::Integer(number) => Ok(*number),
        Value::Text(text) => text.trim().parse::<i64>().map_err(|_| {
            FieldError::new(column, FieldErrorReason::NotAnInteger(text.clone()))
        }),
        Value::Null => Err(FieldError::new(column, FieldErrorReason::Null)),
    }
}

#[cfg(test)]
mod tests {
    use super::{validate_values, FieldErrorReason, ProductValues, Value, WriteMode};
    use crate::model::product::{ProductColumn, ProductType};

    fn apples() -> ProductValues {
        ProductValues::for_product("Apples", "Acme", "555-0100", ProductType::Grocery, 10, 200)
    }

    #[test]
    fn complete_insert_payload_is_accepted_in_column_order() {
        let validated = validate_values(&apples(), WriteMode::Insert).unwrap();
        let columns: Vec<_> = validated.iter().map(|(column, _)| *column).collect();
        assert_eq!(columns, ProductColumn::WRITABLE.to_vec());
    }

    #[test]
    fn insert_reports_first_missing_column() {
        let mut values = apples();
        values.remove(ProductColumn::Phone);
        let err = validate_values(&values, WriteMode::Insert).unwrap_err();
        assert_eq!(err.field, ProductColumn::Phone);
        assert_eq!(err.reason, FieldErrorReason::Required);
    }

    #[test]
    fn update_skips_absent_columns() {
        let values = ProductValues::new().with(ProductColumn::Quantity, 3);
        let validated = validate_values(&values, WriteMode::Update).unwrap();
        assert_eq!(validated.len(), 1);
    }

    #[test]
    fn empty_supplier_is_allowed_but_null_is_not() {
        let values = ProductValues::new().with(ProductColumn::Supplier, "");
        assert!(validate_values(&values, WriteMode::Update).is_ok());

        let mut values = ProductValues::new();
        values.put_null(ProductColumn::Supplier);
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert_eq!(err.reason, FieldErrorReason::Null);
    }

    #[test]
    fn type_must_be_known_and_non_null() {
        let values = ProductValues::new().with(ProductColumn::Type, 9);
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert_eq!(err.field, ProductColumn::Type);
        assert_eq!(err.reason, FieldErrorReason::InvalidType(9));

        let mut values = ProductValues::new();
        values.put_null(ProductColumn::Type);
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert_eq!(err.reason, FieldErrorReason::Null);
    }

    #[test]
    fn negative_quantity_and_price_are_rejected() {
        let values = ProductValues::new().with(ProductColumn::Quantity, -1);
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert_eq!(err.field, ProductColumn::Quantity);
        assert_eq!(err.reason, FieldErrorReason::Negative(-1));

        let values = ProductValues::new().with(ProductColumn::Price, -5);
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert_eq!(err.field, ProductColumn::Price);
    }

    #[test]
    fn null_quantity_passes_validation() {
        let mut values = ProductValues::new();
        values.put_null(ProductColumn::Quantity);
        let validated = validate_values(&values, WriteMode::Update).unwrap();
        assert_eq!(validated.iter().next().unwrap().1, Value::Null);
    }

    #[test]
    fn numeric_text_is_coerced_for_integer_columns() {
        let values = ProductValues::new().with(ProductColumn::Quantity, " 12 ");
        let validated = validate_values(&values, WriteMode::Update).unwrap();
        assert_eq!(validated.iter().next().unwrap().1, Value::Integer(12));

        let values = ProductValues::new().with(ProductColumn::Price, "cheap");
        let err = validate_values(&values, WriteMode::Update).unwrap_err();
        assert!(matches!(err.reason, FieldErrorReason::NotAnInteger(_)));
    }

    #[test]
    fn id_is_never_writable() {
        let values = apples().with(ProductColumn::Id, 4);
        let err = validate_values(&values, WriteMode::Insert).unwrap_err();
        assert_eq!(err.field, ProductColumn::Id);
        assert_eq!(err.reason, FieldErrorReason::Immutable);
    }
}
