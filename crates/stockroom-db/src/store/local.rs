//! # Local Store
//!
//! SQLite-backed key-value storage. Each collection is one JSON array in
//! the `local_storage` table, under its fixed storage key.
//!
//! ```text
//! local_storage
//! ┌────────────────────┬──────────────────────────────┬──────────────────┐
//! │ key                │ value                        │ updated_at       │
//! ├────────────────────┼──────────────────────────────┼──────────────────┤
//! │ inventory_products │ [{"id":"..","name":..}, ...] │ 2025-12-28T10:.. │
//! │ inventory_sales    │ [{"id":"..","productId":..}] │ 2025-12-28T10:.. │
//! └────────────────────┴──────────────────────────────┴──────────────────┘
//! ```
//!
//! Every mutation is read-modify-write inside one transaction, so a batch
//! touching both keys lands together or not at all.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{apply_write, ensure_id, record_id, Collection, DocumentStore, Record, WriteBatch};
use crate::error::{DbError, DbResult};
use crate::pool::{self, DbConfig};

/// Local SQLite backend.
#[derive(Debug, Clone)]
pub struct LocalStore {
    pool: SqlitePool,
}

impl LocalStore {
    /// Opens (and migrates) the database described by `config`.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let store = LocalStore::open(&DbConfig::in_memory()).await?;
    /// ```
    pub async fn open(config: &DbConfig) -> DbResult<Self> {
        let pool = pool::connect(config).await?;
        Ok(LocalStore { pool })
    }

    /// Wraps an existing, already-migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        LocalStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// True when the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Key-Value Helpers
// =============================================================================

/// Loads the array stored under `key`. A missing key is an empty collection.
async fn load(conn: &mut SqliteConnection, key: &str) -> DbResult<Vec<Record>> {
    let raw: Option<String> = sqlx::query_scalar("SELECT value FROM local_storage WHERE key = ?")
        .bind(key)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let values: Vec<Value> = serde_json::from_str(&raw)?;
    values
        .into_iter()
        .map(|value| match value {
            Value::Object(record) => Ok(record),
            other => Err(DbError::Serialization(format!(
                "expected object under {key}, found {other}"
            ))),
        })
        .collect()
}

/// Overwrites the array stored under `key`.
async fn save(conn: &mut SqliteConnection, key: &str, records: &[Record]) -> DbResult<()> {
    let raw = serde_json::to_string(records)?;
    sqlx::query(
        r#"
        INSERT INTO local_storage (key, value, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(raw)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

// =============================================================================
// DocumentStore Implementation
// =============================================================================

#[async_trait]
impl DocumentStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn list(&self, collection: Collection) -> DbResult<Vec<Record>> {
        let mut conn = self.pool.acquire().await?;
        let records = load(&mut conn, collection.storage_key()).await?;
        debug!(collection = collection.name(), count = records.len(), "Loaded records");
        Ok(records)
    }

    async fn get(&self, collection: Collection, id: &str) -> DbResult<Option<Record>> {
        let records = self.list(collection).await?;
        Ok(records.into_iter().find(|r| record_id(r) == Some(id)))
    }

    async fn insert(&self, collection: Collection, mut record: Record) -> DbResult<Record> {
        let id = ensure_id(&mut record);
        let key = collection.storage_key();

        let mut tx = self.pool.begin().await?;
        let mut records = load(&mut tx, key).await?;
        records.push(record.clone());
        save(&mut tx, key, &records).await?;
        tx.commit().await?;

        debug!(collection = collection.name(), id = %id, "Inserted record");
        Ok(record)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        mut record: Record,
    ) -> DbResult<Option<Record>> {
        let key = collection.storage_key();
        record.insert("id".to_string(), Value::String(id.to_string()));

        let mut tx = self.pool.begin().await?;
        let mut records = load(&mut tx, key).await?;
        let Some(slot) = records.iter_mut().find(|r| record_id(r) == Some(id)) else {
            debug!(collection = collection.name(), id = %id, "Replace target missing");
            return Ok(None);
        };
        *slot = record.clone();
        save(&mut tx, key, &records).await?;
        tx.commit().await?;

        debug!(collection = collection.name(), id = %id, "Replaced record");
        Ok(Some(record))
    }

    async fn delete(&self, collection: Collection, id: &str) -> DbResult<bool> {
        let key = collection.storage_key();

        let mut tx = self.pool.begin().await?;
        let mut records = load(&mut tx, key).await?;
        let before = records.len();
        records.retain(|r| record_id(r) != Some(id));
        if records.len() == before {
            return Ok(false);
        }
        save(&mut tx, key, &records).await?;
        tx.commit().await?;

        debug!(collection = collection.name(), id = %id, "Deleted record");
        Ok(true)
    }

    async fn commit(&self, batch: WriteBatch) -> DbResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let count = batch.len();

        let mut tx = self.pool.begin().await?;
        let mut touched: HashMap<Collection, Vec<Record>> = HashMap::new();

        for op in batch.writes {
            let collection = op.collection();
            if !touched.contains_key(&collection) {
                let records = load(&mut tx, collection.storage_key()).await?;
                touched.insert(collection, records);
            }
            if let Some(records) = touched.get_mut(&collection) {
                // An error here drops `tx`, rolling back every write so far
                apply_write(records, op)?;
            }
        }

        for (collection, records) in &touched {
            save(&mut tx, collection.storage_key(), records).await?;
        }
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(writes = count, "Committed write batch");
        Ok(())
    }

    async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
