//! Lazy, forward-only query results.
//!
//! # Responsibility
//! - Page through a query result on demand instead of loading it whole.
//! - Keep the change subscription registered for the queried locator.
//!
//! # Invariants
//! - Rows are yielded once, in query order; restarting means querying again.
//! - Each page is read-committed on its own; pages fetched after a concurrent
//!   write reflect that write.
//! - Each page resumes strictly after the previous page's last sort key, so a
//!   row left untouched for the whole iteration is yielded exactly once.
//! - The first error ends iteration.

use crate::db::Database;
use crate::model::product::{Product, ProductColumn};
use crate::notify::Subscription;
use crate::repo::product_repo::{
    Page, ProductPage, ProductQuery, ProductRepository, ProductRow, RepoResult, SortKey,
    SqliteProductRepository,
};
use crate::service::product_service::ProviderResult;
use std::collections::VecDeque;
use std::sync::Arc;

/// Row sequence returned by `ProductService::query`.
pub struct ProductCursor {
    database: Arc<Database>,
    query: ProductQuery,
    page_size: u32,
    resume_after: Option<SortKey>,
    buffer: VecDeque<ProductRow>,
    exhausted: bool,
    subscription: Subscription,
}

impl ProductCursor {
    /// Runs the query and buffers its first page.
    pub(crate) fn open(
        database: Arc<Database>,
        query: ProductQuery,
        page_size: u32,
        subscription: Subscription,
    ) -> ProviderResult<Self> {
        let mut cursor = Self {
            database,
            query,
            page_size: page_size.max(1),
            resume_after: None,
            buffer: VecDeque::new(),
            exhausted: false,
            subscription,
        };
        cursor.fill()?;
        Ok(cursor)
    }

    /// Columns present in every yielded row.
    pub fn projection(&self) -> Vec<ProductColumn> {
        self.query.effective_projection()
    }

    /// Subscription that fires when the queried locator changes.
    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Whether a change arrived since the query ran. Consumes pending events.
    pub fn is_stale(&self) -> bool {
        self.subscription.drain() > 0
    }

    /// Stops iterating and keeps listening for changes.
    pub fn into_subscription(self) -> Subscription {
        self.subscription
    }

    /// Drains remaining rows into full product records.
    ///
    /// Requires a projection covering every column.
    pub fn collect_products(self) -> ProviderResult<Vec<Product>> {
        let mut products = Vec::new();
        for row in self {
            products.push(row?.to_product()?);
        }
        Ok(products)
    }

    fn fill(&mut self) -> ProviderResult<()> {
        let page = Page {
            after: self.resume_after.take(),
            limit: self.page_size,
        };
        let fetched = self.database.read(|conn| -> RepoResult<ProductPage> {
            SqliteProductRepository::new(conn).query_products(&self.query, &page)
        })?;

        if fetched.rows.len() < self.page_size as usize {
            self.exhausted = true;
        }
        self.resume_after = fetched.last_key;
        self.buffer.extend(fetched.rows);
        Ok(())
    }
}

impl Iterator for ProductCursor {
    type Item = ProviderResult<ProductRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.exhausted {
            if let Err(err) = self.fill() {
                self.exhausted = true;
                return Some(Err(err));
            }
        }
        self.buffer.pop_front().map(Ok)
    }
}

