//! # Application Lifecycle
//!
//! [`Stockroom`] wires a storage backend, the repositories, the event bus
//! and the three services together. There is no global state: everything
//! hangs off the value returned by [`Stockroom::open`].
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. Validate AppConfig                                                 │
//! │  2. Open the store                                                     │
//! │       local  ──► LocalStore::open(db_config)   (migrations run here)  │
//! │       remote ──► RemoteStore::new(remote_config)                       │
//! │  3. Build repositories, EventBus, services                             │
//! │  4. Seed sample catalog and sales if enabled and the store is empty    │
//! │                                                                         │
//! │  shutdown() closes the store; later service calls fail or read empty. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use stockroom_db::{
    DbError, DocumentStore, LocalStore, ProductRepository, RemoteStore, SaleRepository,
};
use thiserror::Error;
use tracing::info;

use crate::analytics::AnalyticsService;
use crate::config::{AppConfig, ConfigError, StorageBackend};
use crate::controller::Controller;
use crate::error::ServiceError;
use crate::events::{EventBus, EventReceiver};
use crate::inventory::InventoryService;
use crate::sales::SalesService;

/// Why the application could not start.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Could not open storage: {0}")]
    Storage(#[from] DbError),

    #[error("Could not seed sample data: {0}")]
    Seed(#[from] ServiceError),
}

/// A running application instance.
///
/// Cheap to clone; clones share the store and the event bus.
#[derive(Debug, Clone)]
pub struct Stockroom {
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
    events: EventBus,
    inventory: InventoryService,
    sales: SalesService,
    analytics: AnalyticsService,
}

impl Stockroom {
    /// Opens the configured backend and seeds it when asked to.
    pub async fn open(config: AppConfig) -> Result<Self, StartupError> {
        config.validate()?;

        let store: Arc<dyn DocumentStore> = match config.backend() {
            StorageBackend::Local => Arc::new(LocalStore::open(&config.db_config()).await?),
            StorageBackend::Remote => {
                let remote = config.remote_config().ok_or_else(|| {
                    ConfigError::Invalid(
                        "storage.remote_url is required for the remote backend".into(),
                    )
                })?;
                Arc::new(RemoteStore::new(&remote)?)
            }
        };

        let app = Self::with_store(config, store);
        if app.config.app.seed_sample_data {
            app.seed_if_empty().await?;
        }

        info!(backend = app.store.backend(), "Stockroom opened");
        Ok(app)
    }

    /// Builds the application over an already opened store. Does not seed.
    pub fn with_store(config: AppConfig, store: Arc<dyn DocumentStore>) -> Self {
        let products = ProductRepository::new(store.clone());
        let sales = SaleRepository::new(store.clone());
        let events = EventBus::new(config.app.event_capacity);
        let thresholds = config.thresholds();

        Stockroom {
            inventory: InventoryService::new(products.clone(), events.clone(), thresholds),
            sales: SalesService::new(sales.clone(), products.clone(), events.clone()),
            analytics: AnalyticsService::new(sales, products, thresholds),
            config,
            store,
            events,
        }
    }

    /// Seeds the sample catalog, then the sample sales, each only if its
    /// collection is empty.
    ///
    /// ## Returns
    /// `(products seeded, sales seeded)`
    pub async fn seed_if_empty(&self) -> Result<(usize, usize), ServiceError> {
        let products = self.inventory.initialize_if_empty().await?;
        let sales = self.sales.initialize_if_empty().await?;
        Ok((products, sales))
    }

    /// Closes the store.
    pub async fn shutdown(self) {
        self.store.close().await;
        info!(backend = self.store.backend(), "Stockroom shut down");
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    pub fn sales(&self) -> &SalesService {
        &self.sales
    }

    pub fn analytics(&self) -> &AnalyticsService {
        &self.analytics
    }

    /// A controller subscribed to this instance's events.
    pub fn controller(&self) -> Controller {
        Controller::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory_without_seed() {
        let app = Stockroom::open(AppConfig::in_memory()).await.unwrap();
        assert_eq!(app.store().backend(), "local");
        assert!(app.inventory().all_products().await.is_empty());
        app.shutdown().await;
    }

    #[tokio::test]
    async fn test_open_seeds_once() {
        let mut config = AppConfig::in_memory();
        config.app.seed_sample_data = true;
        let app = Stockroom::open(config).await.unwrap();

        assert_eq!(app.inventory().all_products().await.len(), 8);
        assert_eq!(app.sales().all_sales().await.len(), 5);
        assert_eq!(app.seed_if_empty().await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let mut config = AppConfig::in_memory();
        config.stock.high = 5;
        config.stock.medium = 5;
        assert!(matches!(
            Stockroom::open(config).await,
            Err(StartupError::Config(_))
        ));

        let remote = AppConfig::remote("not a url");
        assert!(Stockroom::open(remote).await.is_err());
    }

    #[tokio::test]
    async fn test_thresholds_flow_into_services() {
        let mut config = AppConfig::in_memory();
        config.stock.medium = 20;
        config.stock.high = 40;
        config.app.seed_sample_data = true;
        let app = Stockroom::open(config).await.unwrap();

        // 8, 6 and 15 are all at or below 20
        assert_eq!(app.inventory().low_stock_products().await.len(), 3);
    }

    #[tokio::test]
    async fn test_shutdown_degrades_reads() {
        let app = Stockroom::open(AppConfig::in_memory()).await.unwrap();
        let clone = app.clone();
        app.shutdown().await;
        assert!(clone.sales().all_sales().await.is_empty());
    }
}
