//! Product repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Translate validated writes, selections, projections and sort orders into
//!   SQL against the `products` table.
//! - Decode stored rows back into typed values.
//!
//! # Invariants
//! - Only [`ValidatedValues`] reach write statements.
//! - Caller selections are wrapped in parentheses and bound positionally;
//!   their placeholders must be anonymous `?`.
//! - Read paths reject stored values of unexpected storage class instead of
//!   masking them.
//! - Query pages are keyed on the last row's sort values, never on a row
//!   offset; deleting or inserting rows between pages cannot shift an
//!   untouched row out of the remaining result.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::product::{Product, ProductColumn, ProductId, ProductType, TABLE_NAME};
use crate::model::values::{ValidatedValues, Value};
use log::warn;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params_from_iter, Connection, ErrorCode, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for product persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Caller-supplied row filter: a SQL predicate plus bound arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    clause: Option<String>,
    args: Vec<Value>,
}

impl Selection {
    /// Matches every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filters with `clause`, binding `args` to its `?` placeholders in order.
    pub fn new<I, V>(clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let clause = clause.into();
        let clause = if clause.trim().is_empty() {
            None
        } else {
            Some(clause)
        };
        Self {
            clause,
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches exactly the row with `id`.
    pub fn by_id(id: ProductId) -> Self {
        Self::new("id = ?", [id])
    }

    pub fn clause(&self) -> Option<&str> {
        self.clause.as_deref()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    fn push_where(&self, sql: &mut String, binds: &mut Vec<SqlValue>) {
        if let Some(clause) = self.clause.as_deref() {
            sql.push_str(" WHERE (");
            sql.push_str(clause);
            sql.push(')');
            binds.extend(self.args.iter().map(to_sql_value));
        }
    }
}

/// Direction for one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Comparison selecting rows that sort after a key value.
    fn after_operator(self) -> &'static str {
        match self {
            Self::Ascending => ">",
            Self::Descending => "<",
        }
    }
}

/// Ordered list of sort keys. Rows tie-break on `id` ascending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortOrder {
    keys: Vec<(ProductColumn, SortDirection)>,
}

impl SortOrder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, column: ProductColumn, direction: SortDirection) -> Self {
        self.keys.push((column, direction));
        self
    }

    pub fn ascending(column: ProductColumn) -> Self {
        Self::new().then(column, SortDirection::Ascending)
    }

    pub fn descending(column: ProductColumn) -> Self {
        Self::new().then(column, SortDirection::Descending)
    }

    /// Sort keys with the `id` tiebreak applied; this order is total.
    fn effective_keys(&self) -> Vec<(ProductColumn, SortDirection)> {
        let mut keys = self.keys.clone();
        if !keys.iter().any(|(column, _)| *column == ProductColumn::Id) {
            keys.push((ProductColumn::Id, SortDirection::Ascending));
        }
        keys
    }

    fn to_sql(&self) -> String {
        self.effective_keys()
            .iter()
            .map(|(column, direction)| format!("{column} {}", direction.as_sql()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Read request: projection, filter and order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Requested columns in order; empty selects every column.
    pub projection: Vec<ProductColumn>,
    pub selection: Selection,
    pub sort: SortOrder,
}

impl ProductQuery {
    /// Projection with duplicates removed, defaulting to all columns.
    pub fn effective_projection(&self) -> Vec<ProductColumn> {
        if self.projection.is_empty() {
            return ProductColumn::ALL.to_vec();
        }
        let mut seen = BTreeSet::new();
        self.projection
            .iter()
            .copied()
            .filter(|column| seen.insert(*column))
            .collect()
    }
}

/// Sort-key values of one row, in effective sort order (`id` last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey(Vec<Value>);

/// Window into a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Resume strictly after this key; `None` starts at the first row.
    pub after: Option<SortKey>,
    pub limit: u32,
}

/// Rows of one page plus the key to resume after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    pub rows: Vec<ProductRow>,
    /// Key of the last row; `None` when the page is empty.
    pub last_key: Option<SortKey>,
}

/// One projected row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    columns: Vec<ProductColumn>,
    values: Vec<Value>,
}

impl ProductRow {
    pub fn columns(&self) -> &[ProductColumn] {
        &self.columns
    }

    /// Value for `column`, or `None` when it was not projected.
    pub fn get(&self, column: ProductColumn) -> Option<&Value> {
        self.columns
            .iter()
            .position(|candidate| *candidate == column)
            .map(|index| &self.values[index])
    }

    pub fn id(&self) -> Option<ProductId> {
        self.get(ProductColumn::Id).and_then(Value::as_integer)
    }

    /// Decodes a row that projected every column.
    pub fn to_product(&self) -> RepoResult<Product> {
        let code = self.integer(ProductColumn::Type)?;
        let kind = ProductType::from_code(code).ok_or_else(|| {
            RepoError::InvalidData(format!("invalid product type `{code}` in products.type"))
        })?;

        Ok(Product {
            id: self.integer(ProductColumn::Id)?,
            name: self.text(ProductColumn::Name)?,
            supplier: self.text(ProductColumn::Supplier)?,
            phone: self.text(ProductColumn::Phone)?,
            kind,
            quantity: self.integer(ProductColumn::Quantity)?,
            price: self.integer(ProductColumn::Price)?,
        })
    }

    fn integer(&self, column: ProductColumn) -> RepoResult<i64> {
        self.get(column)
            .and_then(Value::as_integer)
            .ok_or_else(|| missing_or_mistyped(column))
    }

    fn text(&self, column: ProductColumn) -> RepoResult<String> {
        self.get(column)
            .and_then(Value::as_text)
            .map(str::to_string)
            .ok_or_else(|| missing_or_mistyped(column))
    }
}

fn missing_or_mistyped(column: ProductColumn) -> RepoError {
    RepoError::InvalidData(format!("column `{column}` missing or mistyped in products row"))
}

/// Repository interface for product persistence.
pub trait ProductRepository {
    /// Inserts one row; `None` when the engine created no row.
    fn insert_product(&self, values: &ValidatedValues) -> RepoResult<Option<ProductId>>;
    fn query_products(&self, query: &ProductQuery, page: &Page) -> RepoResult<ProductPage>;
    fn count_products(&self, selection: &Selection) -> RepoResult<u64>;
    fn update_products(&self, values: &ValidatedValues, selection: &Selection)
        -> RepoResult<usize>;
    fn delete_products(&self, selection: &Selection) -> RepoResult<usize>;
}

/// SQLite-backed product repository over a borrowed connection or transaction.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Wraps a connection already bootstrapped by [`crate::db`].
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Wraps a connection after verifying its schema version and table shape.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
        let present = stmt
            .query_map([TABLE_NAME], |row| row.get::<_, String>(0))?
            .collect::<Result<BTreeSet<_>, _>>()?;
        if present.is_empty() {
            return Err(RepoError::MissingRequiredTable(TABLE_NAME));
        }
        if let Some(column) = ProductColumn::ALL
            .iter()
            .find(|column| !present.contains(column.as_str()))
        {
            return Err(RepoError::MissingRequiredColumn {
                table: TABLE_NAME,
                column: column.as_str(),
            });
        }

        Ok(Self { conn })
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn insert_product(&self, values: &ValidatedValues) -> RepoResult<Option<ProductId>> {
        let columns: Vec<&str> = values.iter().map(|(column, _)| column.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {TABLE_NAME} ({}) VALUES ({placeholders});",
            columns.join(", ")
        );
        let binds = values.iter().map(|(_, value)| to_sql_value(value));

        match self.conn.execute(&sql, params_from_iter(binds)) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(self.conn.last_insert_rowid())),
            Err(err) if is_constraint_violation(&err) => {
                warn!("event=product_insert module=repo status=rejected reason=constraint");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn query_products(&self, query: &ProductQuery, page: &Page) -> RepoResult<ProductPage> {
        let projection = query.effective_projection();
        let keys = query.sort.effective_keys();
        // Sort columns the caller did not project are fetched and trimmed later.
        let mut fetched = projection.clone();
        for (column, _) in &keys {
            if !fetched.contains(column) {
                fetched.push(*column);
            }
        }
        let column_list: Vec<&str> = fetched.iter().map(|column| column.as_str()).collect();

        let mut sql = format!("SELECT {} FROM {TABLE_NAME}", column_list.join(", "));
        let mut binds = Vec::new();
        let mut predicates = Vec::new();
        if let Some(clause) = query.selection.clause() {
            predicates.push(format!("({clause})"));
            binds.extend(query.selection.args().iter().map(to_sql_value));
        }
        if let Some(after) = &page.after {
            predicates.push(format!("({})", keyset_clause(&keys, after, &mut binds)?));
        }
        if !predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }
        sql.push_str(" ORDER BY ");
        sql.push_str(&query.sort.to_sql());
        sql.push_str(" LIMIT ?;");
        binds.push(SqlValue::Integer(i64::from(page.limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(parse_product_row(row, &fetched)?);
        }

        let last_key = out.last().map(|row| sort_key(row, &keys)).transpose()?;
        for row in &mut out {
            row.columns.truncate(projection.len());
            row.values.truncate(projection.len());
        }
        Ok(ProductPage {
            rows: out,
            last_key,
        })
    }

    fn count_products(&self, selection: &Selection) -> RepoResult<u64> {
        let mut sql = format!("SELECT COUNT(*) FROM {TABLE_NAME}");
        let mut binds = Vec::new();
        selection.push_where(&mut sql, &mut binds);

        let count: i64 = self
            .conn
            .query_row(&sql, params_from_iter(binds), |row| row.get(0))?;
        u64::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative row count `{count}`")))
    }

    fn update_products(
        &self,
        values: &ValidatedValues,
        selection: &Selection,
    ) -> RepoResult<usize> {
        let assignments: Vec<String> = values
            .iter()
            .map(|(column, _)| format!("{column} = ?"))
            .collect();
        let mut sql = format!("UPDATE {TABLE_NAME} SET {}", assignments.join(", "));
        let mut binds: Vec<SqlValue> =
            values.iter().map(|(_, value)| to_sql_value(value)).collect();
        selection.push_where(&mut sql, &mut binds);

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }

    fn delete_products(&self, selection: &Selection) -> RepoResult<usize> {
        let mut sql = format!("DELETE FROM {TABLE_NAME}");
        let mut binds = Vec::new();
        selection.push_where(&mut sql, &mut binds);

        Ok(self.conn.execute(&sql, params_from_iter(binds))?)
    }
}

fn parse_product_row(row: &Row<'_>, projection: &[ProductColumn]) -> RepoResult<ProductRow> {
    let mut values = Vec::with_capacity(projection.len());
    for (index, column) in projection.iter().enumerate() {
        let value = match row.get::<_, SqlValue>(index)? {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(number) => Value::Integer(number),
            SqlValue::Text(text) => Value::Text(text),
            other => {
                return Err(RepoError::InvalidData(format!(
                    "unexpected storage class {:?} in products.{column}",
                    other.data_type()
                )));
            }
        };
        values.push(value);
    }
    Ok(ProductRow {
        columns: projection.to_vec(),
        values,
    })
}

fn sort_key(row: &ProductRow, keys: &[(ProductColumn, SortDirection)]) -> RepoResult<SortKey> {
    keys.iter()
        .map(|(column, _)| {
            row.get(*column)
                .cloned()
                .ok_or_else(|| missing_or_mistyped(*column))
        })
        .collect::<RepoResult<Vec<_>>>()
        .map(SortKey)
}

/// Builds `(k1 > ?) OR (k1 = ? AND k2 > ?) OR ...` selecting rows after `after`.
///
/// Every sort column is `NOT NULL`, so plain comparisons are total.
fn keyset_clause(
    keys: &[(ProductColumn, SortDirection)],
    after: &SortKey,
    binds: &mut Vec<SqlValue>,
) -> RepoResult<String> {
    if after.0.len() != keys.len() {
        return Err(RepoError::InvalidData(format!(
            "sort key has {} values for {} sort columns",
            after.0.len(),
            keys.len()
        )));
    }

    let mut branches = Vec::with_capacity(keys.len());
    for (index, (column, direction)) in keys.iter().enumerate() {
        let mut terms: Vec<String> = keys[..index]
            .iter()
            .map(|(prefix, _)| format!("{prefix} = ?"))
            .collect();
        terms.push(format!("{column} {} ?", direction.after_operator()));
        binds.extend(after.0[..=index].iter().map(to_sql_value));
        branches.push(format!("({})", terms.join(" AND ")));
    }
    Ok(branches.join(" OR "))
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(number) => SqlValue::Integer(*number),
        Value::Text(text) => SqlValue::Text(text.clone()),
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}
