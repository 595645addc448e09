//! # stockroom-db: Storage Layer for Stockroom
//!
//! Persistence for products and sales behind one [`DocumentStore`] trait,
//! with two interchangeable backends and typed repositories on top.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Data Flow                              │
//! │                                                                         │
//! │  SalesService::process_sale                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockroom-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ Repositories  │    │ DocumentStore │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ ProductRepo   │───►│ LocalStore    │    │ 001_local_   │  │   │
//! │  │   │ SaleRepo      │    │ RemoteStore   │    │  storage.sql │  │   │
//! │  │   └───────────────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │                                │                                │   │
//! │  └────────────────────────────────┼────────────────────────────────┘   │
//! │                    ┌──────────────┴──────────────┐                      │
//! │                    ▼                             ▼                      │
//! │        SQLite (stockroom.db)          HTTP document API                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - `DocumentStore` trait, queries, write batches, backends
//! - [`pool`] - SQLite pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`repository`] - Typed repositories (product, sale)
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stockroom_db::{DbConfig, LocalStore, ProductRepository};
//!
//! let store = Arc::new(LocalStore::open(&DbConfig::new("stockroom.db")).await?);
//! let products = ProductRepository::new(store.clone());
//! let pants = products.get_by_category(Category::Pants).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::DbConfig;
pub use store::{
    Collection, DocumentStore, LocalStore, Query, Record, RemoteConfig, RemoteStore, WriteBatch,
};

// Repository re-exports for convenience
pub use repository::product::ProductRepository;
pub use repository::sale::SaleRepository;
pub use repository::{Entity, Repository};
