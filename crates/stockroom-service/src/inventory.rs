//! # Inventory Service
//!
//! Product lifecycle and stock adjustments.
//!
//! ## Write Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation          Checks                         Events               │
//! │  ─────────────────  ─────────────────────────────  ─────────────────── │
//! │  add_product        validate draft                 ProductAdded         │
//! │                                                    DataChanged          │
//! │  update_product     exists, validate merged form   ProductUpdated       │
//! │                                                    DataChanged          │
//! │  delete_product     exists                         ProductDeleted       │
//! │                                                    DataChanged          │
//! │  reduce_stock       exists, qty > 0, qty <= stock  ProductUpdated       │
//! │  restock            exists, qty > 0                DataChanged          │
//! │  initialize_if_     only when no products          DataChanged (once)   │
//! │    empty                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every check runs before anything is written. Reads never fail: a storage
//! error is logged and the read returns an empty result.

use serde::Serialize;
use stockroom_core::catalog::sample_products;
use stockroom_core::{
    timestamp_now, Category, DomainEvent, Money, Product, ProductDraft, ProductUpdate, StockLevel,
    StockThresholds, ValidationError, MAX_STOCK,
};
use stockroom_db::ProductRepository;
use tracing::info;

use crate::error::{or_empty, ServiceError, ServiceResult};
use crate::events::EventBus;

/// Products that need attention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlerts {
    pub low_stock: Vec<Product>,
    pub out_of_stock: Vec<Product>,
}

impl StockAlerts {
    pub fn is_empty(&self) -> bool {
        self.low_stock.is_empty() && self.out_of_stock.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct InventoryService {
    products: ProductRepository,
    events: EventBus,
    thresholds: StockThresholds,
}

impl InventoryService {
    pub fn new(products: ProductRepository, events: EventBus, thresholds: StockThresholds) -> Self {
        InventoryService {
            products,
            events,
            thresholds,
        }
    }

    pub fn thresholds(&self) -> &StockThresholds {
        &self.thresholds
    }

    pub fn stock_level(&self, product: &Product) -> StockLevel {
        product.stock_level(&self.thresholds)
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Validates and stores a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product, with its id
    /// * `Err(ServiceError::Validation)` - Every rule the draft broke
    pub async fn add_product(&self, draft: &ProductDraft) -> ServiceResult<Product> {
        let product = draft.build(timestamp_now())?;
        let created = self.products.create(&product).await?;

        info!(id = %created.id, name = %created.name, stock = created.stock, "Product added");
        self.events.emit(DomainEvent::ProductAdded(created.clone()));
        self.events.emit(DomainEvent::DataChanged);
        Ok(created)
    }

    /// Applies `update` field by field and re-validates the whole product.
    pub async fn update_product(&self, id: &str, update: &ProductUpdate) -> ServiceResult<Product> {
        let current = self.require(id).await?;
        let updated = current.with_update(update, timestamp_now())?;

        let saved = self
            .products
            .save(&updated)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(id))?;

        info!(id = %saved.id, "Product updated");
        self.events.emit(DomainEvent::ProductUpdated(saved.clone()));
        self.events.emit(DomainEvent::DataChanged);
        Ok(saved)
    }

    /// Removes a product. Its sales stay, keeping their snapshots.
    ///
    /// ## Returns
    /// The product as it was before deletion.
    pub async fn delete_product(&self, id: &str) -> ServiceResult<Product> {
        let product = self.require(id).await?;
        if !self.products.delete(id).await? {
            return Err(ServiceError::product_not_found(id));
        }

        info!(id = %id, name = %product.name, "Product deleted");
        self.events.emit(DomainEvent::ProductDeleted(product.clone()));
        self.events.emit(DomainEvent::DataChanged);
        Ok(product)
    }

    /// Takes `quantity` units off the shelf.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product after the reduction
    /// * `Err(ServiceError::InsufficientStock)` - Fewer than `quantity` on
    ///   hand; stock is unchanged
    pub async fn reduce_stock(&self, id: &str, quantity: i64) -> ServiceResult<Product> {
        require_positive_quantity(quantity)?;
        let product = self
            .products
            .reduce_stock(id, quantity)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(id))?;

        info!(id = %id, quantity, stock = product.stock, "Stock reduced");
        self.stock_changed(&product);
        Ok(product)
    }

    /// Puts `quantity` units on the shelf.
    pub async fn restock(&self, id: &str, quantity: i64) -> ServiceResult<Product> {
        require_positive_quantity(quantity)?;
        let product = self
            .products
            .add_stock(id, quantity)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(id))?;

        info!(id = %id, quantity, stock = product.stock, "Product restocked");
        self.stock_changed(&product);
        Ok(product)
    }

    /// Seeds the sample catalog when there are no products yet.
    ///
    /// ## Returns
    /// How many products were seeded (0 when the catalog already had some).
    pub async fn initialize_if_empty(&self) -> ServiceResult<usize> {
        if self.products.count().await? > 0 {
            return Ok(0);
        }

        let samples = sample_products(timestamp_now());
        for product in &samples {
            self.products.create(product).await?;
        }

        info!(count = samples.len(), "Sample catalog seeded");
        self.events.emit(DomainEvent::DataChanged);
        Ok(samples.len())
    }

    async fn require(&self, id: &str) -> ServiceResult<Product> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(id))
    }

    fn stock_changed(&self, product: &Product) {
        self.events.emit(DomainEvent::ProductUpdated(product.clone()));
        self.events.emit(DomainEvent::DataChanged);
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn all_products(&self) -> Vec<Product> {
        or_empty(self.products.get_all().await, "all_products")
    }

    pub async fn product(&self, id: &str) -> Option<Product> {
        or_empty(self.products.get_by_id(id).await, "product")
    }

    pub async fn products_by_category(&self, category: Category) -> Vec<Product> {
        or_empty(
            self.products.get_by_category(category).await,
            "products_by_category",
        )
    }

    pub async fn search_products(&self, term: &str) -> Vec<Product> {
        or_empty(self.products.search(term).await, "search_products")
    }

    pub async fn low_stock_products(&self) -> Vec<Product> {
        or_empty(
            self.products.get_low_stock(&self.thresholds).await,
            "low_stock_products",
        )
    }

    pub async fn out_of_stock_products(&self) -> Vec<Product> {
        or_empty(self.products.get_out_of_stock().await, "out_of_stock_products")
    }

    /// Products with stock on hand, for the sale form.
    pub async fn sellable_products(&self) -> Vec<Product> {
        let mut products = self.all_products().await;
        products.retain(Product::is_in_stock);
        products
    }

    pub async fn total_stock(&self) -> i64 {
        or_empty(self.products.total_stock().await, "total_stock")
    }

    /// Stock valued at cost.
    pub async fn total_inventory_value(&self) -> Money {
        self.all_products()
            .await
            .iter()
            .map(Product::inventory_value)
            .sum()
    }

    /// Stock valued at selling price.
    pub async fn total_potential_revenue(&self) -> Money {
        self.all_products()
            .await
            .iter()
            .map(Product::potential_revenue)
            .sum()
    }

    pub async fn stock_alerts(&self) -> StockAlerts {
        let products = self.all_products().await;
        let (out_of_stock, rest): (Vec<_>, Vec<_>) =
            products.into_iter().partition(|p| !p.is_in_stock());
        StockAlerts {
            low_stock: rest
                .into_iter()
                .filter(|p| p.is_low_stock(&self.thresholds))
                .collect(),
            out_of_stock,
        }
    }
}

fn require_positive_quantity(quantity: i64) -> ServiceResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into());
    }
    if quantity > MAX_STOCK {
        return Err(ValidationError::TooLarge {
            field: "quantity".to_string(),
            max: MAX_STOCK.to_string(),
        }
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
