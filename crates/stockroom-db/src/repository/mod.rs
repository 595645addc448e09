//! # Repository Module
//!
//! Typed collection access over a [`DocumentStore`].
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layering                                  │
//! │                                                                         │
//! │  InventoryService / SalesService / AnalyticsService                    │
//! │       │                                                                 │
//! │       │  products.get_low_stock(&thresholds)                           │
//! │       ▼                                                                 │
//! │  ProductRepository / SaleRepository   ← domain queries, atomic ops     │
//! │       │                                                                 │
//! │       │  Deref                                                          │
//! │       ▼                                                                 │
//! │  Repository<T: Entity>                ← get_all, get_by_id, create,    │
//! │       │                                 update, delete, count           │
//! │       │  Record (JSON object)                                           │
//! │       ▼                                                                 │
//! │  Arc<dyn DocumentStore>               ← local or remote                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Products, stock queries and adjustments
//! - [`SaleRepository`](sale::SaleRepository) - Sales, date queries, atomic sale commit/revert

pub mod product;
pub mod sale;

use std::fmt::Debug;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use stockroom_core::{CoreResult, Product, Sale};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::store::{generate_id, Collection, DocumentStore, Query, Record, WriteBatch};

// =============================================================================
// Entity
// =============================================================================

/// A type stored as one record in one collection.
pub trait Entity: Serialize + DeserializeOwned + Clone + Debug + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> &str;

    fn set_id(&mut self, id: String);

    /// Encodes to storage form.
    fn to_record(&self) -> DbResult<Record> {
        match serde_json::to_value(self)? {
            Value::Object(record) => Ok(record),
            other => Err(DbError::Serialization(format!(
                "{} did not encode to an object: {other}",
                Self::COLLECTION.entity()
            ))),
        }
    }

    /// Decodes from storage form.
    fn from_record(record: Record) -> DbResult<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}

impl Entity for Product {
    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Entity for Sale {
    const COLLECTION: Collection = Collection::Sales;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Gives `entity` a fresh id if it has none.
pub(crate) fn with_id<T: Entity>(entity: &T) -> T {
    let mut entity = entity.clone();
    if entity.id().is_empty() {
        entity.set_id(generate_id());
    }
    entity
}

// =============================================================================
// Generic Repository
// =============================================================================

/// CRUD over one collection.
///
/// ## Contract
/// - `get_by_id` and `update` return `None` for unknown ids
/// - `delete` returns `false` for unknown ids
/// - storage failures are `Err`
#[derive(Debug, Clone)]
pub struct Repository<T: Entity> {
    store: Arc<dyn DocumentStore>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Repository {
            store,
            _entity: PhantomData,
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub async fn get_all(&self) -> DbResult<Vec<T>> {
        self.store
            .list(T::COLLECTION)
            .await?
            .into_iter()
            .map(T::from_record)
            .collect()
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<T>> {
        match self.store.get(T::COLLECTION, id).await? {
            Some(record) => Ok(Some(T::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Stores a new entity, assigning an id if it has none.
    ///
    /// ## Returns
    /// The entity as stored (with its id).
    pub async fn create(&self, entity: &T) -> DbResult<T> {
        let entity = with_id(entity);
        let stored = self.store.insert(T::COLLECTION, entity.to_record()?).await?;
        debug!(collection = T::COLLECTION.name(), id = %entity.id(), "Created");
        T::from_record(stored)
    }

    /// Writes `entity` over the stored one with the same id.
    pub async fn save(&self, entity: &T) -> DbResult<Option<T>> {
        match self
            .store
            .replace(T::COLLECTION, entity.id(), entity.to_record()?)
            .await?
        {
            Some(record) => Ok(Some(T::from_record(record)?)),
            None => Ok(None),
        }
    }

    /// Loads the entity, applies `change`, and writes it back.
    ///
    /// ## Returns
    /// * `Ok(Some(T))` - Updated entity
    /// * `Ok(None)` - No entity with that id
    /// * `Err(DbError::Domain)` - `change` rejected the edit; nothing written
    pub async fn update<F>(&self, id: &str, change: F) -> DbResult<Option<T>>
    where
        F: FnOnce(&mut T) -> CoreResult<()>,
    {
        let Some(mut entity) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        change(&mut entity)?;
        self.save(&entity).await
    }

    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let deleted = self.store.delete(T::COLLECTION, id).await?;
        debug!(collection = T::COLLECTION.name(), id = %id, deleted, "Delete");
        Ok(deleted)
    }

    /// Removes every entity in one batch. Returns how many were removed.
    pub async fn delete_all(&self) -> DbResult<usize> {
        let all = self.get_all().await?;
        let mut batch = WriteBatch::new();
        for entity in &all {
            batch.delete(T::COLLECTION, entity.id());
        }
        self.store.commit(batch).await?;
        Ok(all.len())
    }

    pub async fn count(&self) -> DbResult<usize> {
        Ok(self.store.list(T::COLLECTION).await?.len())
    }

    pub async fn exists(&self, id: &str) -> DbResult<bool> {
        Ok(self.store.get(T::COLLECTION, id).await?.is_some())
    }

    /// Entities matching `query`.
    pub async fn find(&self, query: &Query) -> DbResult<Vec<T>> {
        self.store
            .query(T::COLLECTION, query)
            .await?
            .into_iter()
            .map(T::from_record)
            .collect()
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
    use chrono::{TimeZone, Utc};
    use stockroom_core::{Category, CoreError, Money};

    async fn repo() -> Repository<Product> {
        let store = LocalStore::open(&DbConfig::in_memory()).await.unwrap();
        Repository::new(Arc::new(store))
    }

    fn tee() -> Product {
        Product::new(
            "Basic White Tee",
            Category::Shirts,
            45,
            Money::from_cents(850),
            Money::from_cents(1999),
            Utc.with_ymd_and_hms(2025, 12, 28, 9, 0, 0).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_create_assigns_id_and_round_trips() {
        let repo = repo().await;
        let created = repo.create(&tee()).await.unwrap();
        assert!(!created.id.is_empty());

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.exists(&created.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_create_keeps_given_id() {
        let repo = repo().await;
        let mut p = tee();
        p.id = "tee".to_string();
        assert_eq!(repo.create(&p).await.unwrap().id, "tee");
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let repo = repo().await;
        let result = repo.update("missing", |p| {
            p.stock = 1;
            Ok(())
        });
        assert!(result.await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_rejected_change_writes_nothing() {
        let repo = repo().await;
        let created = repo.create(&tee()).await.unwrap();

        let err = repo
            .update(&created.id, |p| p.reduce_stock(100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 45, .. })
        ));
        assert_eq!(repo.get_by_id(&created.id).await.unwrap().unwrap().stock, 45);
    }

    #[tokio::test]
    async fn test_delete_and_delete_all() {
        let repo = repo().await;
        let a = repo.create(&tee()).await.unwrap();
        repo.create(&tee()).await.unwrap();
        repo.create(&tee()).await.unwrap();

        assert!(repo.delete(&a.id).await.unwrap());
        assert!(!repo.delete(&a.id).await.unwrap());
        assert_eq!(repo.delete_all().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);
    }
}
