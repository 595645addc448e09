//! # Sale Repository
//!
//! Sale storage, date-based queries, and the two compound writes that keep
//! stock consistent with the sale log.
//!
//! ## Atomic Sale Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  commit_sale(sale, product_after)                                       │
//! │                                                                         │
//! │     WriteBatch ┬─ insert  sales/{sale.id}                               │
//! │                └─ replace products/{product.id}   (stock - qty)        │
//! │                                                                         │
//! │  revert_sale(sale, Some(product_restored))                              │
//! │                                                                         │
//! │     WriteBatch ┬─ delete  sales/{sale.id}                               │
//! │                └─ replace products/{product.id}   (stock + qty)        │
//! │                                                                         │
//! │  Both writes land, or neither does. A crash can never leave a sale     │
//! │  without its stock change.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::ops::Deref;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use stockroom_core::{analytics, Money, Product, Sale};
use tracing::{debug, info};

use super::{with_id, Entity, Repository};
use crate::error::DbResult;
use crate::store::{Collection, DocumentStore, Query, WriteBatch};

/// Repository for sales.
///
/// Derefs to [`Repository<Sale>`] for the basic CRUD operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    inner: Repository<Sale>,
}

impl Deref for SaleRepository {
    type Target = Repository<Sale>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl SaleRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        SaleRepository {
            inner: Repository::new(store),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_by_product_id(&self, product_id: &str) -> DbResult<Vec<Sale>> {
        self.find(&Query::new().where_eq("productId", product_id)).await
    }

    /// Sales with `start <= date <= end`.
    pub async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sales = self.get_all().await?;
        Ok(sales
            .into_iter()
            .filter(|s| s.date >= start && s.date <= end)
            .collect())
    }

    /// The `limit` newest sales, newest first.
    pub async fn get_recent(&self, limit: usize) -> DbResult<Vec<Sale>> {
        Ok(analytics::recent_sales(&self.get_all().await?, limit))
    }

    /// Sales on one calendar day (UTC).
    pub async fn get_on(&self, day: NaiveDate) -> DbResult<Vec<Sale>> {
        let sales = self.get_all().await?;
        Ok(sales
            .into_iter()
            .filter(|s| s.date.date_naive() == day)
            .collect())
    }

    pub async fn get_today(&self) -> DbResult<Vec<Sale>> {
        self.get_on(Utc::now().date_naive()).await
    }

    /// Sales in one calendar month (UTC), including its last day.
    pub async fn get_in_month(&self, year: i32, month: u32) -> DbResult<Vec<Sale>> {
        let sales = self.get_all().await?;
        Ok(sales
            .into_iter()
            .filter(|s| s.date.year() == year && s.date.month() == month)
            .collect())
    }

    pub async fn get_this_month(&self) -> DbResult<Vec<Sale>> {
        let now = Utc::now();
        self.get_in_month(now.year(), now.month()).await
    }

    pub async fn total_revenue(&self) -> DbResult<Money> {
        Ok(analytics::total_revenue(&self.get_all().await?))
    }

    pub async fn total_profit(&self) -> DbResult<Money> {
        Ok(analytics::total_profit(&self.get_all().await?))
    }

    // =========================================================================
    // Atomic Compound Writes
    // =========================================================================

    /// Records `sale` and writes `product_after` (its stock already reduced)
    /// in one batch.
    ///
    /// ## Returns
    /// The sale as stored, with its id.
    pub async fn commit_sale(&self, sale: &Sale, product_after: &Product) -> DbResult<Sale> {
        let sale = with_id(sale);

        let mut batch = WriteBatch::new();
        batch
            .insert(Collection::Sales, sale.to_record()?)
            .replace(Collection::Products, &product_after.id, product_after.to_record()?);
        self.store().commit(batch).await?;

        info!(
            sale_id = %sale.id,
            product_id = %product_after.id,
            quantity = sale.quantity,
            stock = product_after.stock,
            "Sale committed"
        );
        Ok(sale)
    }

    /// Deletes `sale` and, when the product still exists, writes it back with
    /// its stock restored, in one batch.
    pub async fn revert_sale(
        &self,
        sale: &Sale,
        product_restored: Option<&Product>,
    ) -> DbResult<()> {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Sales, &sale.id);
        if let Some(product) = product_restored {
            batch.replace(Collection::Products, &product.id, product.to_record()?);
        }
        self.store().commit(batch).await?;

        debug!(sale_id = %sale.id, restored = product_restored.is_some(), "Sale reverted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
