//! # Sales Service
//!
//! Selling and un-selling, with stock kept in step.
//!
//! ## Sale Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       process_sale(request)                             │
//! │                                                                         │
//! │  1. Load product ───────────── missing ──► NOT_FOUND                   │
//! │  2. validate_sale(request, stock) ─ bad ──► VALIDATION_ERROR           │
//! │  3. Sale::snapshot(product)     captures name, price, cost             │
//! │  4. product.reduce_stock(qty)                                          │
//! │  5. commit_sale ─ one batch: insert sale + replace product             │
//! │        │                                                                │
//! │        └── fails ──► STORAGE_ERROR, nothing written                    │
//! │  6. emit SaleAdded, ProductUpdated, DataChanged                        │
//! │                                                                         │
//! │                       delete_sale(id)                                   │
//! │                                                                         │
//! │  1. Load sale ──────────────── missing ──► NOT_FOUND                   │
//! │  2. Load product; if gone, warn and skip the restore                   │
//! │  3. revert_sale ─ one batch: delete sale (+ replace product)           │
//! │  4. emit SaleDeleted, DataChanged                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use stockroom_core::catalog::sample_sales;
use stockroom_core::validation::validate_sale;
use stockroom_core::{timestamp_now, DomainEvent, Sale, SalePreview, SaleRequest};
use stockroom_db::{ProductRepository, SaleRepository};
use tracing::{info, warn};

use crate::error::{or_empty, ServiceError, ServiceResult};
use crate::events::EventBus;

/// Default length of the recent-sales list.
pub const DEFAULT_RECENT_SALES: usize = 10;

#[derive(Debug, Clone)]
pub struct SalesService {
    sales: SaleRepository,
    products: ProductRepository,
    events: EventBus,
}

impl SalesService {
    pub fn new(sales: SaleRepository, products: ProductRepository, events: EventBus) -> Self {
        SalesService {
            sales,
            products,
            events,
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Sells `request.quantity` units now.
    pub async fn process_sale(&self, request: &SaleRequest) -> ServiceResult<Sale> {
        self.process_sale_at(request, timestamp_now()).await
    }

    /// Sells `request.quantity` units, dating the sale `at`.
    ///
    /// ## Returns
    /// * `Ok(Sale)` - The recorded sale; the product's stock went down by
    ///   the same quantity in the same write
    /// * `Err(ServiceError::NotFound)` - Unknown product
    /// * `Err(ServiceError::Validation)` - Bad quantity or not enough stock;
    ///   nothing written
    pub async fn process_sale_at(
        &self,
        request: &SaleRequest,
        at: DateTime<Utc>,
    ) -> ServiceResult<Sale> {
        if request.product_id.trim().is_empty() {
            // No product, so no stock to check against
            return Err(validate_sale(request, request.quantity.max(0)).into());
        }

        let mut product = self
            .products
            .get_by_id(&request.product_id)
            .await?
            .ok_or_else(|| ServiceError::product_not_found(&request.product_id))?;

        let report = validate_sale(request, product.stock);
        if !report.is_valid() {
            return Err(report.into());
        }

        let sale = Sale::snapshot(&product, request.quantity, at);
        product.reduce_stock(request.quantity)?;
        product.updated_at = Some(at);

        let stored = self.sales.commit_sale(&sale, &product).await?;

        info!(
            sale_id = %stored.id,
            product = %stored.product_name,
            quantity = stored.quantity,
            total = %stored.total(),
            "Sale processed"
        );
        self.events.emit(DomainEvent::SaleAdded(stored.clone()));
        self.events.emit(DomainEvent::ProductUpdated(product));
        self.events.emit(DomainEvent::DataChanged);
        Ok(stored)
    }

    /// Removes a sale and puts its quantity back on the product.
    ///
    /// A product deleted since the sale is skipped with a warning; the sale
    /// is still removed.
    ///
    /// ## Returns
    /// The removed sale.
    pub async fn delete_sale(&self, id: &str) -> ServiceResult<Sale> {
        let sale = self
            .sales
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::sale_not_found(id))?;

        let restored = match self.products.get_by_id(&sale.product_id).await? {
            Some(mut product) => {
                product.add_stock(sale.quantity)?;
                product.updated_at = Some(timestamp_now());
                Some(product)
            }
            None => {
                warn!(
                    sale_id = %sale.id,
                    product_id = %sale.product_id,
                    "Product no longer exists, stock not restored"
                );
                None
            }
        };

        self.sales.revert_sale(&sale, restored.as_ref()).await?;

        info!(sale_id = %sale.id, quantity = sale.quantity, "Sale deleted");
        self.events.emit(DomainEvent::SaleDeleted(sale.clone()));
        self.events.emit(DomainEvent::DataChanged);
        Ok(sale)
    }

    /// Seeds the sample sales history when there are no sales yet.
    ///
    /// Runs after the product catalog is seeded; sales whose product is
    /// missing are skipped. Stock is not touched.
    pub async fn initialize_if_empty(&self) -> ServiceResult<usize> {
        if self.sales.count().await? > 0 {
            return Ok(0);
        }

        let samples = sample_sales(&self.products.get_all().await?);
        if samples.is_empty() {
            return Ok(0);
        }
        for sale in &samples {
            self.sales.create(sale).await?;
        }

        info!(count = samples.len(), "Sample sales seeded");
        self.events.emit(DomainEvent::DataChanged);
        Ok(samples.len())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// What selling `quantity` units would look like. Writes nothing.
    ///
    /// `None` when the product is unknown.
    pub async fn calculate_sale_preview(
        &self,
        product_id: &str,
        quantity: i64,
    ) -> Option<SalePreview> {
        let product = or_empty(self.products.get_by_id(product_id).await, "sale_preview")?;
        Some(SalePreview::for_product(&product, quantity))
    }

    pub async fn all_sales(&self) -> Vec<Sale> {
        or_empty(self.sales.get_all().await, "all_sales")
    }

    pub async fn sale(&self, id: &str) -> Option<Sale> {
        or_empty(self.sales.get_by_id(id).await, "sale")
    }

    pub async fn sales_by_product(&self, product_id: &str) -> Vec<Sale> {
        or_empty(self.sales.get_by_product_id(product_id).await, "sales_by_product")
    }

    /// Newest first.
    pub async fn recent_sales(&self, limit: usize) -> Vec<Sale> {
        or_empty(self.sales.get_recent(limit).await, "recent_sales")
    }

    pub async fn today_sales(&self) -> Vec<Sale> {
        or_empty(self.sales.get_today().await, "today_sales")
    }

    pub async fn month_sales(&self) -> Vec<Sale> {
        or_empty(self.sales.get_this_month().await, "month_sales")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::events::EventReceiver;
    use chrono::TimeZone;
    use std::sync::Arc;
    use stockroom_core::{Category, EventKind, Money, Product};
    use stockroom_db::{DbConfig, DocumentStore, LocalStore};

    struct Fixture {
        sales: SalesService,
        products: ProductRepository,
        rx: EventReceiver,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> =
            Arc::new(LocalStore::open(&DbConfig::in_memory()).await.unwrap());
        let bus = EventBus::default();
        let rx = bus.subscribe();
        let products = ProductRepository::new(store.clone());
        Fixture {
            sales: SalesService::new(SaleRepository::new(store), products.clone(), bus),
            products,
            rx,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, day, 15, 30, 0).unwrap()
    }

    async fn jeans(products: &ProductRepository) -> Product {
        let product = Product::new(
            "Slim Fit Jeans",
            Category::Pants,
            10,
            Money::from_cents(500),
            Money::from_cents(1000),
            at(1),
        );
        products.create(&product).await.unwrap()
    }

    fn kinds(rx: &mut EventReceiver) -> Vec<EventKind> {
        rx.drain().iter().map(DomainEvent::kind).collect()
    }

    #[tokio::test]
    async fn test_sell_then_oversell() {
        let mut f = fixture().await;
        let product = jeans(&f.products).await;

        let sale = f
            .sales
            .process_sale_at(&SaleRequest::new(&product.id, 3), at(28))
            .await
            .unwrap();
        assert_eq!(sale.total().cents(), 3000);
        assert_eq!(sale.profit().cents(), 1500);
        assert_eq!(sale.date, at(28));
        assert_eq!(f.products.get_by_id(&product.id).await.unwrap().unwrap().stock, 7);
        assert_eq!(
            kinds(&mut f.rx),
            vec![
                EventKind::SaleAdded,
                EventKind::ProductUpdated,
                EventKind::DataChanged
            ]
        );

        let err = f
            .sales
            .process_sale(&SaleRequest::new(&product.id, 8))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.messages()[0].contains("7 available"));
        assert_eq!(f.products.get_by_id(&product.id).await.unwrap().unwrap().stock, 7);
        assert_eq!(f.sales.all_sales().await.len(), 1);
        assert!(f.rx.drain().is_empty());
    }

    #[tokio::test]
    async fn test_sale_keeps_snapshot_after_product_edit() {
        let f = fixture().await;
        let mut product = jeans(&f.products).await;
        let sale = f
            .sales
            .process_sale(&SaleRequest::new(&product.id, 2))
            .await
            .unwrap();

        product = f.products.get_by_id(&product.id).await.unwrap().unwrap();
        product.price = Money::from_cents(5000);
        f.products.save(&product).await.unwrap();

        let stored = f.sales.sale(&sale.id).await.unwrap();
        assert_eq!(stored.price.cents(), 1000);
        assert_eq!(stored.product_name, "Slim Fit Jeans");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let f = fixture().await;
        let product = jeans(&f.products).await;

        let err = f.sales.process_sale(&SaleRequest::new("", 1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert_eq!(err.messages()[0], "productId is required");

        let err = f.sales.process_sale(&SaleRequest::new("ghost", 1)).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        let err = f
            .sales
            .process_sale(&SaleRequest::new(&product.id, 0))
            .await
            .unwrap_err();
        assert_eq!(err.messages(), vec!["quantity must be positive"]);
    }

    #[tokio::test]
    async fn test_delete_sale_restores_stock() {
        let mut f = fixture().await;
        let product = jeans(&f.products).await;
        let sale = f
            .sales
            .process_sale(&SaleRequest::new(&product.id, 4))
            .await
            .unwrap();
        f.rx.drain();

        let deleted = f.sales.delete_sale(&sale.id).await.unwrap();
        assert_eq!(deleted.id, sale.id);
        assert_eq!(f.products.get_by_id(&product.id).await.unwrap().unwrap().stock, 10);
        assert!(f.sales.all_sales().await.is_empty());
        assert_eq!(
            kinds(&mut f.rx),
            vec![EventKind::SaleDeleted, EventKind::DataChanged]
        );

        let err = f.sales.delete_sale(&sale.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(f.rx.drain().is_empty());
    }

    #[tokio::test]
    async fn test_delete_sale_of_deleted_product() {
        let f = fixture().await;
        let product = jeans(&f.products).await;
        let sale = f
            .sales
            .process_sale(&SaleRequest::new(&product.id, 1))
            .await
            .unwrap();
        f.products.delete(&product.id).await.unwrap();

        f.sales.delete_sale(&sale.id).await.unwrap();
        assert!(f.sales.all_sales().await.is_empty());
        assert_eq!(f.products.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_preview_is_read_only() {
        let f = fixture().await;
        let product = jeans(&f.products).await;

        let preview = f.sales.calculate_sale_preview(&product.id, 12).await.unwrap();
        assert_eq!(preview.total.cents(), 12000);
        assert_eq!(preview.profit.cents(), 6000);
        assert_eq!(preview.available_stock, 10);
        assert!(!preview.can_sell);

        assert!(f.sales.calculate_sale_preview(&product.id, 10).await.unwrap().can_sell);
        assert!(f.sales.calculate_sale_preview("ghost", 1).await.is_none());
        assert_eq!(f.products.get_by_id(&product.id).await.unwrap().unwrap().stock, 10);
        assert!(f.sales.all_sales().await.is_empty());
    }

    #[tokio::test]
    async fn test_reads() {
        let f = fixture().await;
        let product = jeans(&f.products).await;
        for day in [10, 20, 30] {
            f.sales
                .process_sale_at(&SaleRequest::new(&product.id, 1), at(day))
                .await
                .unwrap();
        }
        f.sales
            .process_sale(&SaleRequest::new(&product.id, 1))
            .await
            .unwrap();

        let recent = f.sales.recent_sales(2).await;
        assert_eq!(recent.len(), 2);
        assert!(recent[0].date >= recent[1].date);
        assert_eq!(f.sales.sales_by_product(&product.id).await.len(), 4);
        assert_eq!(f.sales.today_sales().await.len(), 1);
        assert!(!f.sales.month_sales().await.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_sample_sales() {
        let f = fixture().await;
        assert_eq!(f.sales.initialize_if_empty().await.unwrap(), 0);

        for product in stockroom_core::catalog::sample_products(at(1)) {
            f.products.create(&product).await.unwrap();
        }
        assert_eq!(f.sales.initialize_if_empty().await.unwrap(), 5);
        assert_eq!(f.sales.initialize_if_empty().await.unwrap(), 0);
        assert_eq!(f.products.total_stock().await.unwrap(), 224);
    }
}
