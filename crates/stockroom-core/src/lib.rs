//! # stockroom-core: Pure Inventory & Sales Logic
//!
//! This crate is the **heart** of Stockroom. It owns the product and sale
//! entities, input validation and the analytics folds, all as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Browser UI (views, forms, navigation)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ view models / input                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │      stockroom-service (Inventory, Sales, Analytics, Bus)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ stockroom-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │ analytics │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │  totals   │  │   rules   │  │   │
//! │  │   │   Sale    │  │           │  │  top-N    │  │  reports  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           stockroom-db (local SQLite / remote documents)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Category, StockLevel, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Product and sale input validation
//! - [`analytics`] - Revenue, profit, top-N and trend folds over sales
//! - [`events`] - Domain change notifications
//! - [`catalog`] - Sample catalog used to seed an empty inventory
//!
//! ## Example Usage
//!
//! ```rust
//! use stockroom_core::money::Money;
//! use stockroom_core::analytics;
//! use stockroom_core::types::{Category, Product, Sale};
//! use chrono::{TimeZone, Utc};
//!
//! let at = Utc.with_ymd_and_hms(2025, 12, 28, 10, 0, 0).unwrap();
//! let mut shirt = Product::new("Basic Tee", Category::Shirts, 10,
//!     Money::from_cents(500), Money::from_cents(1000), at);
//! shirt.id = "tee".to_string();
//!
//! let sale = Sale::snapshot(&shirt, 3, at);
//! assert_eq!(sale.total().cents(), 3000);
//! assert_eq!(sale.profit().cents(), 1500);
//!
//! let summary = analytics::summarize(&[sale]);
//! assert_eq!(summary.profit, summary.revenue - summary.costs);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod catalog;
pub mod error;
pub mod events;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use events::{DomainEvent, EventKind};
pub use money::Money;
pub use types::*;
pub use validation::ValidationReport;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Stock above this level is reported as `high`.
pub const HIGH_STOCK_THRESHOLD: i64 = 30;

/// Stock above this level (and up to the high threshold) is `medium`.
/// Stock between 1 and this level is `low`.
pub const MEDIUM_STOCK_THRESHOLD: i64 = 10;

/// Category reported for sales whose product has since been deleted.
pub const UNKNOWN_CATEGORY: &str = "N/A";

/// Number of entries shown in the dashboard's top products list.
pub const DASHBOARD_TOP_PRODUCTS: usize = 5;

/// Number of sales shown in the dashboard's recent sales list.
pub const DASHBOARD_RECENT_SALES: usize = 5;

/// Default window of the sales trend chart, in days.
pub const DEFAULT_TREND_DAYS: u32 = 7;

/// Longest sales trend window, in days. Longer requests are clamped.
pub const MAX_TREND_DAYS: u32 = 366;

/// Most units a product may hold, and most a single sale or restock may move.
pub const MAX_STOCK: i64 = 1_000_000;

/// Highest unit cost or price accepted, in cents ($1,000,000.00).
pub const MAX_UNIT_CENTS: i64 = 100_000_000;
