//! # Analytics Service
//!
//! Loads the current sales (and products, where a join is needed) and runs
//! the folds from [`stockroom_core::analytics`]. Nothing is cached; every
//! call reads storage and recomputes.
//!
//! Read-only. A storage failure is logged and the report is computed over
//! empty lists, so the dashboard shows zeros instead of an error.

use chrono::{NaiveDate, Utc};
use stockroom_core::analytics::{
    self, CategoryProfit, DashboardStats, PerformanceMetrics, ProductProfitability, SalesSummary,
    TopProduct, TrendPoint,
};
use stockroom_core::{
    Money, Product, Sale, StockThresholds, DASHBOARD_RECENT_SALES, DASHBOARD_TOP_PRODUCTS,
};
use stockroom_db::{ProductRepository, SaleRepository};
use tracing::debug;

use crate::error::or_empty;

#[derive(Debug, Clone)]
pub struct AnalyticsService {
    sales: SaleRepository,
    products: ProductRepository,
    thresholds: StockThresholds,
}

impl AnalyticsService {
    pub fn new(
        sales: SaleRepository,
        products: ProductRepository,
        thresholds: StockThresholds,
    ) -> Self {
        AnalyticsService {
            sales,
            products,
            thresholds,
        }
    }

    async fn load_sales(&self) -> Vec<Sale> {
        or_empty(self.sales.get_all().await, "analytics_sales")
    }

    async fn load_products(&self) -> Vec<Product> {
        or_empty(self.products.get_all().await, "analytics_products")
    }

    // =========================================================================
    // Totals
    // =========================================================================

    pub async fn total_revenue(&self) -> Money {
        analytics::total_revenue(&self.load_sales().await)
    }

    pub async fn total_costs(&self) -> Money {
        analytics::total_costs(&self.load_sales().await)
    }

    pub async fn total_profit(&self) -> Money {
        analytics::total_profit(&self.load_sales().await)
    }

    /// Profit as a percentage of revenue; 0 with no revenue.
    pub async fn average_margin(&self) -> f64 {
        analytics::average_margin(&self.load_sales().await)
    }

    /// All four totals from one read.
    pub async fn summary(&self) -> SalesSummary {
        analytics::summarize(&self.load_sales().await)
    }

    // =========================================================================
    // Rollups
    // =========================================================================

    pub async fn top_products(&self, limit: usize) -> Vec<TopProduct> {
        analytics::top_products(&self.load_sales().await, limit)
    }

    /// Sales whose product has been deleted are left out.
    pub async fn profits_by_category(&self) -> Vec<CategoryProfit> {
        let (sales, products) = (self.load_sales().await, self.load_products().await);
        analytics::profits_by_category(&sales, &products)
    }

    pub async fn product_profitability(&self) -> Vec<ProductProfitability> {
        let (sales, products) = (self.load_sales().await, self.load_products().await);
        analytics::product_profitability(&sales, &products)
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let (sales, products) = (self.load_sales().await, self.load_products().await);
        debug!(sales = sales.len(), products = products.len(), "Computing dashboard stats");
        analytics::dashboard_stats(
            &sales,
            &products,
            DASHBOARD_TOP_PRODUCTS,
            DASHBOARD_RECENT_SALES,
        )
    }

    /// Daily buckets for the last `days` days, today included (UTC).
    /// At most `MAX_TREND_DAYS` buckets are returned.
    pub async fn sales_trend(&self, days: u32) -> Vec<TrendPoint> {
        self.sales_trend_until(days, Utc::now().date_naive()).await
    }

    /// Daily buckets for the `days` days ending at `today`.
    pub async fn sales_trend_until(&self, days: u32, today: NaiveDate) -> Vec<TrendPoint> {
        analytics::sales_trend(&self.load_sales().await, days, today)
    }

    pub async fn performance_metrics(&self) -> PerformanceMetrics {
        let (sales, products) = (self.load_sales().await, self.load_products().await);
        analytics::performance_metrics(&sales, &products, &self.thresholds)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::inventory::InventoryService;
    use crate::sales::SalesService;
    use chrono::{DateTime, TimeZone};
    use std::sync::Arc;
    use stockroom_core::{Category, SaleRequest};
    use stockroom_db::{DbConfig, DocumentStore, LocalStore};

    struct Fixture {
        analytics: AnalyticsService,
        inventory: InventoryService,
        sales: SalesService,
        store: Arc<dyn DocumentStore>,
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn DocumentStore> =
            Arc::new(LocalStore::open(&DbConfig::in_memory()).await.unwrap());
        let products = ProductRepository::new(store.clone());
        let sales = SaleRepository::new(store.clone());
        let bus = EventBus::default();
        let thresholds = StockThresholds::default();
        Fixture {
            analytics: AnalyticsService::new(sales.clone(), products.clone(), thresholds),
            inventory: InventoryService::new(products.clone(), bus.clone(), thresholds),
            sales: SalesService::new(sales, products, bus),
            store,
        }
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, day, 12, 0, 0).unwrap()
    }

    async fn id_of(f: &Fixture, name: &str) -> String {
        f.inventory.search_products(name).await.remove(0).id
    }

    async fn sell(f: &Fixture, name: &str, quantity: i64, day: u32) {
        let id = id_of(f, name).await;
        f.sales
            .process_sale_at(&SaleRequest::new(id, quantity), at(day))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_store() {
        let f = fixture().await;
        assert_eq!(f.analytics.average_margin().await, 0.0);
        assert!(f.analytics.top_products(5).await.is_empty());

        let metrics = f.analytics.performance_metrics().await;
        assert_eq!(metrics.total_sales, 0);
        assert_eq!(metrics.average_sale_value, Money::zero());
    }

    #[tokio::test]
    async fn test_totals_over_sample_history() {
        let f = fixture().await;
        f.inventory.initialize_if_empty().await.unwrap();
        f.sales.initialize_if_empty().await.unwrap();

        let summary = f.analytics.summary().await;
        // 5×19.99 + 3×59.99 + 2×79.99 + 4×29.99 + 7×24.99
        assert_eq!(summary.revenue.cents(), 73_479);
        assert_eq!(summary.profit, summary.revenue - summary.costs);
        assert_eq!(f.analytics.total_revenue().await, summary.revenue);
        assert_eq!(f.analytics.total_profit().await, summary.profit);

        let top = f.analytics.top_products(3).await;
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].product_name, "Slim Fit Jeans");
        assert!(top.windows(2).all(|w| w[0].revenue >= w[1].revenue));

        let dashboard = f.analytics.dashboard_stats().await;
        assert_eq!(dashboard.total_inventory, 224);
        assert_eq!(dashboard.top_products.len(), 5);
        assert_eq!(dashboard.recent_sales[0].product_name, "Printed Tee");
    }

    #[tokio::test]
    async fn test_category_rollup_skips_deleted_products() {
        let f = fixture().await;
        f.inventory.initialize_if_empty().await.unwrap();
        sell(&f, "Leather Jacket", 1, 5).await;
        sell(&f, "Wool Scarf", 2, 5).await;

        let scarf = id_of(&f, "Wool Scarf").await;
        f.inventory.delete_product(&scarf).await.unwrap();

        let categories = f.analytics.profits_by_category().await;
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].category, Category::Jackets);

        let per_product = f.analytics.product_profitability().await;
        assert_eq!(per_product.len(), 2);
        let orphan = per_product.iter().find(|p| p.product_id == scarf).unwrap();
        assert_eq!(orphan.category, "N/A");
    }

    #[tokio::test]
    async fn test_trend_buckets() {
        let f = fixture().await;
        f.inventory.initialize_if_empty().await.unwrap();
        sell(&f, "Printed Tee", 1, 29).await;
        sell(&f, "Printed Tee", 2, 30).await;

        let today = NaiveDate::from_ymd_opt(2025, 12, 30).unwrap();
        let trend = f.analytics.sales_trend_until(2, today).await;
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].sales, 1);
        assert_eq!(trend[1].revenue.cents(), 2 * 2499);

        let week = f.analytics.sales_trend_until(7, today).await;
        assert_eq!(week.iter().filter(|p| p.sales == 0).count(), 5);
        assert_eq!(f.analytics.sales_trend(3).await.len(), 3);
    }

    #[tokio::test]
    async fn test_metrics_and_degraded_reads() {
        let f = fixture().await;
        f.inventory.initialize_if_empty().await.unwrap();
        sell(&f, "Evening Gown", 6, 1).await;
        sell(&f, "Track Pants", 1, 2).await;

        let metrics = f.analytics.performance_metrics().await;
        assert_eq!(metrics.total_products, 8);
        assert_eq!(metrics.total_sales, 2);
        assert_eq!(metrics.out_of_stock_products, 1);
        assert_eq!(metrics.low_stock_products, 1);
        assert_eq!(metrics.average_units_per_sale, 3.5);
        // (6×149.99 + 44.99) / 2
        assert_eq!(metrics.average_sale_value.cents(), 47_247);

        f.store.close().await;
        assert_eq!(f.analytics.total_revenue().await, Money::zero());
        assert!(f.analytics.dashboard_stats().await.recent_sales.is_empty());
    }
}
