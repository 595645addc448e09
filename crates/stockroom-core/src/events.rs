//! # Domain Events
//!
//! Change notifications emitted after a successful write.
//!
//! ```text
//! add_product     ──► ProductAdded   ──► DataChanged
//! update_product  ──► ProductUpdated ──► DataChanged
//! delete_product  ──► ProductDeleted ──► DataChanged
//! process_sale    ──► SaleAdded ──► ProductUpdated ──► DataChanged
//! delete_sale     ──► SaleDeleted    ──► DataChanged
//! seed catalog    ──────────────────────► DataChanged
//! ```
//!
//! The payload carries the entity as it was written (or, for deletes, as
//! it was just before removal).

use serde::Serialize;
use ts_rs::TS;

use crate::types::{Product, Sale};

/// Payload-free event discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export)]
pub enum EventKind {
    #[serde(rename = "product:added")]
    ProductAdded,
    #[serde(rename = "product:updated")]
    ProductUpdated,
    #[serde(rename = "product:deleted")]
    ProductDeleted,
    #[serde(rename = "sale:added")]
    SaleAdded,
    #[serde(rename = "sale:deleted")]
    SaleDeleted,
    #[serde(rename = "data:changed")]
    DataChanged,
}

impl EventKind {
    /// Wire name, e.g. `sale:added`.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ProductAdded => "product:added",
            EventKind::ProductUpdated => "product:updated",
            EventKind::ProductDeleted => "product:deleted",
            EventKind::SaleAdded => "sale:added",
            EventKind::SaleDeleted => "sale:deleted",
            EventKind::DataChanged => "data:changed",
        }
    }
}

/// A change notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(tag = "event", content = "data")]
#[ts(export)]
pub enum DomainEvent {
    #[serde(rename = "product:added")]
    ProductAdded(Product),
    #[serde(rename = "product:updated")]
    ProductUpdated(Product),
    #[serde(rename = "product:deleted")]
    ProductDeleted(Product),
    #[serde(rename = "sale:added")]
    SaleAdded(Sale),
    #[serde(rename = "sale:deleted")]
    SaleDeleted(Sale),
    #[serde(rename = "data:changed")]
    DataChanged,
}

impl DomainEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DomainEvent::ProductAdded(_) => EventKind::ProductAdded,
            DomainEvent::ProductUpdated(_) => EventKind::ProductUpdated,
            DomainEvent::ProductDeleted(_) => EventKind::ProductDeleted,
            DomainEvent::SaleAdded(_) => EventKind::SaleAdded,
            DomainEvent::SaleDeleted(_) => EventKind::SaleDeleted,
            DomainEvent::DataChanged => EventKind::DataChanged,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(DomainEvent::DataChanged.name(), "data:changed");
        assert_eq!(EventKind::SaleAdded.name(), "sale:added");

        let json = serde_json::to_value(DomainEvent::DataChanged).unwrap();
        assert_eq!(json["event"], "data:changed");
        let json = serde_json::to_value(EventKind::ProductDeleted).unwrap();
        assert_eq!(json, "product:deleted");
    }
}
