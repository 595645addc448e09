//! # Product Repository
//!
//! Product storage plus the stock queries and adjustments built on it.
//!
//! ## Stock Queries
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  get_by_category("Pants")  ──► store query  category == "Pants"        │
//! │  search("tee")             ──► name contains "tee" (case-insensitive)  │
//! │  get_low_stock(&t)         ──► 0 < stock <= t.medium                    │
//! │  get_out_of_stock()        ──► stock == 0                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Adjustments
//! `reduce_stock` refuses to go below zero and writes nothing in that case.

use std::ops::Deref;
use std::sync::Arc;

use stockroom_core::{Category, CoreError, Product, StockThresholds};
use tracing::debug;

use super::Repository;
use crate::error::{DbError, DbResult};
use crate::store::{DocumentStore, Query};

/// Repository for products.
///
/// Derefs to [`Repository<Product>`] for the basic CRUD operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(store.clone());
///
/// let jeans = repo.get_by_category(Category::Pants).await?;
/// let low = repo.get_low_stock(&StockThresholds::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    inner: Repository<Product>,
}

impl Deref for ProductRepository {
    type Target = Repository<Product>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl ProductRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        ProductRepository {
            inner: Repository::new(store),
        }
    }

    pub async fn get_by_category(&self, category: Category) -> DbResult<Vec<Product>> {
        self.find(&Query::new().where_eq("category", category.as_str()))
            .await
    }

    /// Products whose name contains `term`, ignoring case.
    ///
    /// An empty term matches everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Product>> {
        let needle = term.trim().to_lowercase();
        let products = self.get_all().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// In stock, but at or below the medium threshold.
    pub async fn get_low_stock(&self, thresholds: &StockThresholds) -> DbResult<Vec<Product>> {
        let products = self.get_all().await?;
        Ok(products
            .into_iter()
            .filter(|p| p.is_low_stock(thresholds))
            .collect())
    }

    pub async fn get_out_of_stock(&self) -> DbResult<Vec<Product>> {
        let products = self.get_all().await?;
        Ok(products.into_iter().filter(|p| !p.is_in_stock()).collect())
    }

    /// Sets stock to an absolute value.
    ///
    /// ## Returns
    /// * `Ok(None)` - Unknown product
    /// * `Err(DbError::Domain)` - `stock` is negative
    pub async fn update_stock(&self, id: &str, stock: i64) -> DbResult<Option<Product>> {
        if stock < 0 {
            return Err(DbError::Domain(CoreError::Validation(
                stockroom_core::ValidationError::MustNotBeNegative {
                    field: "stock".to_string(),
                },
            )));
        }
        debug!(id = %id, stock, "Setting stock");
        self.update(id, |p| {
            p.stock = stock;
            Ok(())
        })
        .await
    }

    /// Removes `quantity` units.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product after the reduction
    /// * `Ok(None)` - Unknown product
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - Not enough on
    ///   hand; stored stock is unchanged
    pub async fn reduce_stock(&self, id: &str, quantity: i64) -> DbResult<Option<Product>> {
        debug!(id = %id, quantity, "Reducing stock");
        self.update(id, |p| p.reduce_stock(quantity)).await
    }

    /// Adds `quantity` units.
    ///
    /// ## Returns
    /// * `Ok(None)` - Unknown product
    /// * `Err(DbError::Domain)` - The result would exceed `MAX_STOCK`; stored
    ///   stock is unchanged
    pub async fn add_stock(&self, id: &str, quantity: i64) -> DbResult<Option<Product>> {
        debug!(id = %id, quantity, "Adding stock");
        self.update(id, |p| p.add_stock(quantity)).await
    }

    /// Sum of stock over all products.
    pub async fn total_stock(&self) -> DbResult<i64> {
        Ok(self.get_all().await?.iter().map(|p| p.stock).sum())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::DbConfig;
    use crate::store::LocalStore;
    use stockroom_core::catalog::sample_products;
    use stockroom_core::timestamp_now;

    async fn seeded() -> ProductRepository {
        let store = LocalStore::open(&DbConfig::in_memory()).await.unwrap();
        let repo = ProductRepository::new(Arc::new(store));
        for p in sample_products(timestamp_now()) {
            repo.create(&p).await.unwrap();
        }
        repo
    }

    async fn by_name(repo: &ProductRepository, name: &str) -> Product {
        repo.search(name).await.unwrap().remove(0)
    }

    #[tokio::test]
    async fn test_get_by_category() {
        let repo = seeded().await;
        let dresses = repo.get_by_category(Category::Dresses).await.unwrap();
        let names: Vec<_> = dresses.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Floral Summer Dress", "Evening Gown"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let repo = seeded().await;
        assert_eq!(repo.search("TEE").await.unwrap().len(), 2);
        assert_eq!(repo.search("gown").await.unwrap().len(), 1);
        assert!(repo.search("hat").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_low_and_out_of_stock() {
        let repo = seeded().await;
        let thresholds = StockThresholds::default();

        let low = repo.get_low_stock(&thresholds).await.unwrap();
        let names: Vec<_> = low.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Leather Jacket", "Evening Gown"]);

        assert!(repo.get_out_of_stock().await.unwrap().is_empty());
        let gown = by_name(&repo, "Evening Gown").await;
        repo.update_stock(&gown.id, 0).await.unwrap();
        assert_eq!(repo.get_out_of_stock().await.unwrap().len(), 1);
        assert_eq!(repo.get_low_stock(&thresholds).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reduce_stock_never_negative() {
        let repo = seeded().await;
        let jacket = by_name(&repo, "Leather Jacket").await;

        let after = repo.reduce_stock(&jacket.id, 3).await.unwrap().unwrap();
        assert_eq!(after.stock, 5);

        let err = repo.reduce_stock(&jacket.id, 6).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 5,
                requested: 6,
                ..
            })
        ));
        assert_eq!(repo.get_by_id(&jacket.id).await.unwrap().unwrap().stock, 5);

        assert!(repo.reduce_stock("missing", 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_and_set_stock() {
        let repo = seeded().await;
        let scarf = by_name(&repo, "Wool Scarf").await;

        assert_eq!(repo.add_stock(&scarf.id, 8).await.unwrap().unwrap().stock, 40);
        assert!(repo.update_stock(&scarf.id, -1).await.is_err());
        assert_eq!(repo.total_stock().await.unwrap(), 224 + 8);
    }
}
