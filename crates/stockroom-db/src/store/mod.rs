//! # Document Stores
//!
//! One trait, two interchangeable backends.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ProductRepository ──┐                                                 │
//! │   SaleRepository   ───┼──► Arc<dyn DocumentStore>                       │
//! │                       │          │                                      │
//! │                       │          ├── LocalStore  (SQLite, one JSON      │
//! │                       │          │               array per collection)  │
//! │                       │          │                                      │
//! │                       │          └── RemoteStore (HTTP document API,    │
//! │                       │                          one doc per entity)    │
//! │                                                                         │
//! │   Chosen once at startup. Business logic never knows which one it has. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records are plain JSON objects in storage form (camelCase keys, money in
//! cents, timestamps in epoch milliseconds). Every record has a string `id`.
//!
//! ## Atomic Writes
//! [`WriteBatch`] groups inserts, replaces and deletes across collections.
//! [`DocumentStore::commit`] applies all of them or none: the local backend
//! uses one SQLite transaction, the remote backend one `/batch` request.

pub mod local;
pub mod remote;

use std::cmp::Ordering;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DbError, DbResult};

pub use local::LocalStore;
pub use remote::{RemoteConfig, RemoteStore};

/// A stored document.
pub type Record = Map<String, Value>;

// =============================================================================
// Collections
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Products,
    Sales,
}

impl Collection {
    /// Remote collection name.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Sales => "sales",
        }
    }

    /// Local storage key.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Collection::Products => "inventory_products",
            Collection::Sales => "inventory_sales",
        }
    }

    /// Entity name used in error messages.
    pub fn entity(&self) -> &'static str {
        match self {
            Collection::Products => "Product",
            Collection::Sales => "Sale",
        }
    }
}

// =============================================================================
// Record Helpers
// =============================================================================

/// Generates a new document id (UUID v4).
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The record's `id`, if it has a non-empty string one.
pub fn record_id(record: &Record) -> Option<&str> {
    record
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// Makes sure `record` carries an id, generating one if needed. Returns it.
pub fn ensure_id(record: &mut Record) -> String {
    match record_id(record) {
        Some(id) => id.to_string(),
        None => {
            let id = generate_id();
            record.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

// =============================================================================
// Query
// =============================================================================

/// Equality filter on one top-level field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

/// Equality filters plus optional single-field ordering.
///
/// ## Example
/// ```rust
/// use stockroom_db::store::Query;
///
/// let query = Query::new()
///     .where_eq("productId", "p-1")
///     .order_by("date", true);
/// assert_eq!(query.filters.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(Filter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            descending,
        });
        self
    }

    /// True when every filter matches.
    pub fn matches(&self, record: &Record) -> bool {
        self.filters
            .iter()
            .all(|f| record.get(&f.field).unwrap_or(&Value::Null) == &f.value)
    }

    /// Filters and orders `records` in process. Ordering is stable.
    pub fn apply(&self, records: Vec<Record>) -> Vec<Record> {
        let mut matched: Vec<Record> = records.into_iter().filter(|r| self.matches(r)).collect();
        if let Some(order) = &self.order_by {
            matched.sort_by(|a, b| {
                let ordering = compare_values(
                    a.get(&order.field).unwrap_or(&Value::Null),
                    b.get(&order.field).unwrap_or(&Value::Null),
                );
                if order.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        matched
    }
}

/// Total order over JSON values: null < bool < number < string < other.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

// =============================================================================
// Write Batches
// =============================================================================

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum WriteOp {
    Insert {
        collection: Collection,
        record: Record,
    },
    /// Fails the whole batch if `id` is not stored.
    Replace {
        collection: Collection,
        id: String,
        record: Record,
    },
    /// Fails the whole batch if `id` is not stored.
    Delete { collection: Collection, id: String },
}

/// Writes applied all-or-nothing by [`DocumentStore::commit`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    pub writes: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an insert, assigning an id to the record if it lacks one.
    pub fn insert(&mut self, collection: Collection, mut record: Record) -> &mut Self {
        ensure_id(&mut record);
        self.writes.push(WriteOp::Insert { collection, record });
        self
    }

    pub fn replace(
        &mut self,
        collection: Collection,
        id: impl Into<String>,
        record: Record,
    ) -> &mut Self {
        self.writes.push(WriteOp::Replace {
            collection,
            id: id.into(),
            record,
        });
        self
    }

    pub fn delete(&mut self, collection: Collection, id: impl Into<String>) -> &mut Self {
        self.writes.push(WriteOp::Delete {
            collection,
            id: id.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }
}

/// Applies one write to an in-memory copy of a collection.
///
/// A missing replace/delete target is `NotFound` and leaves `records`
/// untouched. The local backend runs this inside its transaction.
pub fn apply_write(records: &mut Vec<Record>, op: WriteOp) -> DbResult<()> {
    match op {
        WriteOp::Insert { mut record, .. } => {
            ensure_id(&mut record);
            records.push(record);
        }
        WriteOp::Replace {
            collection,
            id,
            mut record,
        } => {
            let slot = records
                .iter_mut()
                .find(|r| record_id(r) == Some(id.as_str()))
                .ok_or_else(|| DbError::not_found(collection.entity(), &id))?;
            record.insert("id".to_string(), Value::String(id));
            *slot = record;
        }
        WriteOp::Delete { collection, id } => {
            let before = records.len();
            records.retain(|r| record_id(r) != Some(id.as_str()));
            if records.len() == before {
                return Err(DbError::not_found(collection.entity(), id));
            }
        }
    }
    Ok(())
}

impl WriteOp {
    pub fn collection(&self) -> Collection {
        match self {
            WriteOp::Insert { collection, .. }
            | WriteOp::Replace { collection, .. }
            | WriteOp::Delete { collection, .. } => *collection,
        }
    }
}

// =============================================================================
// DocumentStore Trait
// =============================================================================

/// Collection-of-documents persistence.
///
/// ## Contract
/// - `get` / `replace` return `None` and `delete` returns `false` for an
///   unknown id; they never error for that case
/// - `insert` assigns an id when the record has none
/// - transport and encoding failures surface as `Err`
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug {
    /// Short backend name for logs ("local" / "remote").
    fn backend(&self) -> &'static str;

    async fn list(&self, collection: Collection) -> DbResult<Vec<Record>>;

    async fn get(&self, collection: Collection, id: &str) -> DbResult<Option<Record>>;

    /// Stores a new record and returns it as stored.
    async fn insert(&self, collection: Collection, record: Record) -> DbResult<Record>;

    /// Replaces the record with `id`. The stored record keeps `id`.
    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        record: Record,
    ) -> DbResult<Option<Record>>;

    async fn delete(&self, collection: Collection, id: &str) -> DbResult<bool>;

    /// Records matching `query`. The default filters [`list`](Self::list)
    /// in process.
    async fn query(&self, collection: Collection, query: &Query) -> DbResult<Vec<Record>> {
        Ok(query.apply(self.list(collection).await?))
    }

    /// Applies every write in `batch`, or none of them.
    async fn commit(&self, batch: WriteBatch) -> DbResult<()>;

    /// Releases connections. Later calls fail.
    async fn close(&self);
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_collection_keys() {
        assert_eq!(Collection::Products.storage_key(), "inventory_products");
        assert_eq!(Collection::Sales.storage_key(), "inventory_sales");
        assert_eq!(Collection::Sales.name(), "sales");
    }

    #[test]
    fn test_ensure_id_keeps_existing() {
        let mut r = record(json!({"id": "abc"}));
        assert_eq!(ensure_id(&mut r), "abc");

        let mut r = record(json!({"id": ""}));
        let id = ensure_id(&mut r);
        assert_eq!(id.len(), 36);
        assert_eq!(record_id(&r), Some(id.as_str()));
    }

    #[test]
    fn test_query_filters_and_orders() {
        let records = vec![
            record(json!({"id": "1", "productId": "a", "date": 300})),
            record(json!({"id": "2", "productId": "b", "date": 100})),
            record(json!({"id": "3", "productId": "a", "date": 200})),
        ];

        let result = Query::new()
            .where_eq("productId", "a")
            .order_by("date", true)
            .apply(records.clone());
        let ids: Vec<_> = result.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let ascending = Query::new().order_by("date", false).apply(records);
        let ids: Vec<_> = ascending.iter().filter_map(record_id).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
    }

    #[test]
    fn test_query_wire_form() {
        let query = Query::new().where_eq("category", "Shirts").order_by("name", false);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(
            value,
            json!({
                "filters": [{"field": "category", "value": "Shirts"}],
                "orderBy": {"field": "name", "descending": false}
            })
        );
    }

    #[test]
    fn test_apply_write_missing_target_fails() {
        let mut records = vec![record(json!({"id": "1"}))];
        let err = apply_write(
            &mut records,
            WriteOp::Delete {
                collection: Collection::Sales,
                id: "nope".to_string(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_batch_wire_form() {
        let mut batch = WriteBatch::new();
        batch.delete(Collection::Sales, "s-1");
        let value = serde_json::to_value(&batch).unwrap();
        assert_eq!(
            value,
            json!({"writes": [{"op": "delete", "collection": "sales", "id": "s-1"}]})
        );
    }
}
