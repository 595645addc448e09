//! # stockroom-service: Business Operations for Stockroom
//!
//! The services the UI collaborator calls, the change notifications they
//! emit, configuration, and the controller that turns it all into views.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UI ──► Controller ──┬──► InventoryService ──┐                        │
//! │     ▲                 ├──► SalesService ──────┼──► stockroom-db        │
//! │     │                 └──► AnalyticsService ──┘    repositories        │
//! │     │                              │                                    │
//! │  ViewModel ◄── poll() ◄── EventBus ◄┘ emit(DomainEvent)                │
//! │                                                                         │
//! │   Stockroom::open(AppConfig) builds all of the above                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`app`] - Startup and shutdown, dependency wiring
//! - [`config`] - TOML + environment configuration
//! - [`inventory`] - Product writes, stock adjustments, stock queries
//! - [`sales`] - Sale processing and deletion, sale queries
//! - [`analytics`] - Reports over sales and products
//! - [`events`] - Broadcast event bus
//! - [`controller`] - Active view, view models, form forwarding
//! - [`error`] - Service errors and their UI shape
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockroom_service::{AppConfig, Stockroom, View};
//!
//! let app = Stockroom::open(AppConfig::load_or_default(None)).await?;
//! let mut controller = app.controller();
//! let dashboard = controller.navigate(View::Dashboard).await;
//! ```

pub mod analytics;
pub mod app;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod inventory;
pub mod sales;

pub use analytics::AnalyticsService;
pub use app::{StartupError, Stockroom};
pub use config::{AppConfig, ConfigError, StorageBackend};
pub use controller::{Controller, View, ViewModel};
pub use error::{ErrorCode, ErrorResponse, ServiceError, ServiceResult};
pub use events::{EventBus, EventReceiver};
pub use inventory::{InventoryService, StockAlerts};
pub use sales::SalesService;
