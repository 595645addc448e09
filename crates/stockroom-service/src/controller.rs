//! # View Controller
//!
//! Holds the active view, turns service output into serializable view
//! models and forwards form input to the services.
//!
//! ## Refresh Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   UI ── add_sale(request) ──► Controller ──► SalesService::process_sale│
//! │                                   │                   │                │
//! │                                   │            emit(DataChanged)       │
//! │                                   ▼                   │                │
//! │                               poll() ◄── EventReceiver ◄┘              │
//! │                                   │                                     │
//! │                          DataChanged seen?                              │
//! │                                   │ yes                                 │
//! │                                   ▼                                     │
//! │                         render(active view) ──► ViewModel ──► UI       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures come back as [`ErrorResponse`]: a machine code plus the
//! messages the UI shows inline (validation) or as a notification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stockroom_core::analytics::{
    CategoryProfit, DashboardStats, ProductProfitability, SalesSummary, TrendPoint,
};
use stockroom_core::{
    DomainEvent, Money, Product, ProductDraft, Sale, SalePreview, SaleRequest, StockLevel,
    DEFAULT_TREND_DAYS,
};
use thiserror::Error;
use tracing::debug;

use crate::app::Stockroom;
use crate::error::{ErrorResponse, ServiceResult};
use crate::events::EventReceiver;
use crate::inventory::StockAlerts;

// =============================================================================
// Views
// =============================================================================

/// The four screens of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Dashboard,
    Inventory,
    Sales,
    Profits,
}

impl View {
    pub const ALL: [View; 4] = [View::Dashboard, View::Inventory, View::Sales, View::Profits];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Dashboard => "dashboard",
            View::Inventory => "inventory",
            View::Sales => "sales",
            View::Profits => "profits",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown view: {0}")]
pub struct UnknownView(pub String);

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        View::ALL
            .into_iter()
            .find(|view| view.as_str() == wanted)
            .ok_or_else(|| UnknownView(s.to_string()))
    }
}

// =============================================================================
// View Models
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub alerts: StockAlerts,
    pub trend: Vec<TrendPoint>,
}

/// A product with the figures the inventory grid shows next to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCard {
    #[serde(flatten)]
    pub product: Product,
    pub profit: Money,
    pub margin: f64,
    pub stock_level: StockLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryView {
    pub products: Vec<ProductCard>,
    pub total_stock: i64,
    pub total_inventory_value: Money,
    pub total_potential_revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRow {
    #[serde(flatten)]
    pub sale: Sale,
    pub total: Money,
    pub profit: Money,
    pub margin: f64,
}

impl From<Sale> for SaleRow {
    fn from(sale: Sale) -> Self {
        SaleRow {
            total: sale.total(),
            profit: sale.profit(),
            margin: sale.margin(),
            sale,
        }
    }
}

/// An entry in the sale form's product picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    pub stock: i64,
    pub price: Money,
}

impl From<&Product> for ProductOption {
    fn from(product: &Product) -> Self {
        ProductOption {
            id: product.id.clone(),
            name: product.name.clone(),
            stock: product.stock,
            price: product.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesView {
    /// Newest first.
    pub sales: Vec<SaleRow>,
    /// Only products with stock on hand.
    pub products: Vec<ProductOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitsView {
    pub summary: SalesSummary,
    pub categories: Vec<CategoryProfit>,
    pub products: Vec<ProductProfitability>,
}

/// A rendered view, tagged with its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", content = "data", rename_all = "lowercase")]
pub enum ViewModel {
    Dashboard(DashboardView),
    Inventory(InventoryView),
    Sales(SalesView),
    Profits(ProfitsView),
}

impl ViewModel {
    pub fn view(&self) -> View {
        match self {
            ViewModel::Dashboard(_) => View::Dashboard,
            ViewModel::Inventory(_) => View::Inventory,
            ViewModel::Sales(_) => View::Sales,
            ViewModel::Profits(_) => View::Profits,
        }
    }
}

// =============================================================================
// Controller
// =============================================================================

/// One UI session over a [`Stockroom`].
#[derive(Debug)]
pub struct Controller {
    app: Stockroom,
    events: EventReceiver,
    view: View,
    rendered: Option<ViewModel>,
}

impl Controller {
    /// Subscribes to `app`'s events. Nothing is rendered until the first
    /// [`render`](Self::render) or [`navigate`](Self::navigate).
    pub fn new(app: Stockroom) -> Self {
        let events = app.subscribe();
        Controller {
            app,
            events,
            view: View::default(),
            rendered: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// The last rendered model, if any.
    pub fn current(&self) -> Option<&ViewModel> {
        self.rendered.as_ref()
    }

    /// Switches to `view` and renders it.
    pub async fn navigate(&mut self, view: View) -> &ViewModel {
        debug!(from = %self.view, to = %view, "Navigating");
        self.view = view;
        self.render().await
    }

    /// Rebuilds the active view from current data.
    pub async fn render(&mut self) -> &ViewModel {
        let model = self.build(self.view).await;
        self.rendered.insert(model)
    }

    /// Drains pending events and re-renders if any of them changed data.
    ///
    /// ## Returns
    /// `true` when the view was re-rendered.
    pub async fn poll(&mut self) -> bool {
        let changed = self
            .events
            .drain()
            .iter()
            .any(|event| matches!(event, DomainEvent::DataChanged));
        if changed {
            self.render().await;
        }
        changed
    }

    async fn build(&self, view: View) -> ViewModel {
        match view {
            View::Dashboard => ViewModel::Dashboard(DashboardView {
                stats: self.app.analytics().dashboard_stats().await,
                alerts: self.app.inventory().stock_alerts().await,
                trend: self.app.analytics().sales_trend(DEFAULT_TREND_DAYS).await,
            }),
            View::Inventory => {
                let inventory = self.app.inventory();
                let thresholds = *inventory.thresholds();
                let products = inventory
                    .all_products()
                    .await
                    .into_iter()
                    .map(|product| ProductCard {
                        profit: product.profit(),
                        margin: product.margin(),
                        stock_level: product.stock_level(&thresholds),
                        product,
                    })
                    .collect();
                ViewModel::Inventory(InventoryView {
                    products,
                    total_stock: inventory.total_stock().await,
                    total_inventory_value: inventory.total_inventory_value().await,
                    total_potential_revenue: inventory.total_potential_revenue().await,
                })
            }
            View::Sales => ViewModel::Sales(SalesView {
                sales: self
                    .app
                    .sales()
                    .recent_sales(usize::MAX)
                    .await
                    .into_iter()
                    .map(SaleRow::from)
                    .collect(),
                products: self
                    .app
                    .inventory()
                    .sellable_products()
                    .await
                    .iter()
                    .map(ProductOption::from)
                    .collect(),
            }),
            View::Profits => ViewModel::Profits(ProfitsView {
                summary: self.app.analytics().summary().await,
                categories: self.app.analytics().profits_by_category().await,
                products: self.app.analytics().product_profitability().await,
            }),
        }
    }

    // =========================================================================
    // Form Input
    // =========================================================================

    async fn finish<T>(&mut self, result: ServiceResult<T>) -> Result<T, ErrorResponse> {
        self.poll().await;
        result.map_err(|e| e.to_response())
    }

    pub async fn add_product(&mut self, draft: &ProductDraft) -> Result<Product, ErrorResponse> {
        let result = self.app.inventory().add_product(draft).await;
        self.finish(result).await
    }

    pub async fn delete_product(&mut self, id: &str) -> Result<Product, ErrorResponse> {
        let result = self.app.inventory().delete_product(id).await;
        self.finish(result).await
    }

    pub async fn restock(&mut self, id: &str, quantity: i64) -> Result<Product, ErrorResponse> {
        let result = self.app.inventory().restock(id, quantity).await;
        self.finish(result).await
    }

    pub async fn add_sale(&mut self, request: &SaleRequest) -> Result<Sale, ErrorResponse> {
        let result = self.app.sales().process_sale(request).await;
        self.finish(result).await
    }

    pub async fn delete_sale(&mut self, id: &str) -> Result<Sale, ErrorResponse> {
        let result = self.app.sales().delete_sale(id).await;
        self.finish(result).await
    }

    /// Live total for the sale form. Writes nothing.
    pub async fn preview_sale(&self, request: &SaleRequest) -> Option<SalePreview> {
        self.app
            .sales()
            .calculate_sale_preview(&request.product_id, request.quantity)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::error::ErrorCode;

    async fn seeded() -> Controller {
        let mut config = AppConfig::in_memory();
        config.app.seed_sample_data = true;
        Stockroom::open(config).await.unwrap().controller()
    }

    async fn product_id(c: &Controller, name: &str) -> String {
        c.app.inventory().search_products(name).await.remove(0).id
    }

    #[test]
    fn test_view_names() {
        assert_eq!("Sales".parse::<View>().unwrap(), View::Sales);
        assert_eq!(" profits ".parse::<View>().unwrap(), View::Profits);
        assert!("reports".parse::<View>().is_err());
        assert_eq!(serde_json::to_value(View::Inventory).unwrap(), "inventory");
        assert_eq!(View::default(), View::Dashboard);
    }

    #[tokio::test]
    async fn test_navigate_renders_each_view() {
        let mut c = seeded().await;
        assert!(c.current().is_none());

        for view in View::ALL {
            assert_eq!(c.navigate(view).await.view(), view);
            assert_eq!(c.view(), view);
        }

        match c.navigate(View::Inventory).await {
            ViewModel::Inventory(inv) => {
                assert_eq!(inv.products.len(), 8);
                assert_eq!(inv.total_stock, 224);
                let gown = inv.products.iter().find(|p| p.product.name == "Evening Gown").unwrap();
                assert_eq!(gown.stock_level, StockLevel::Low);
                assert_eq!(gown.profit.cents(), 8999);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sale_refreshes_active_view() {
        let mut c = seeded().await;
        c.navigate(View::Sales).await;
        // seeding events were emitted before this controller subscribed
        assert!(!c.poll().await);

        let gown = product_id(&c, "Evening Gown").await;
        let sale = c.add_sale(&SaleRequest::new(&gown, 6)).await.unwrap();

        match c.current().unwrap() {
            ViewModel::Sales(view) => {
                assert_eq!(view.sales.len(), 6);
                assert_eq!(view.sales[0].sale.id, sale.id);
                assert_eq!(view.sales[0].total.cents(), 6 * 14999);
                assert!(view.products.iter().all(|p| p.id != gown));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failures_become_error_responses() {
        let mut c = seeded().await;
        c.navigate(View::Dashboard).await;

        let gown = product_id(&c, "Evening Gown").await;
        let oversell = c.add_sale(&SaleRequest::new(&gown, 7)).await.unwrap_err();
        assert_eq!(oversell.code, ErrorCode::ValidationError);

        let missing = c.delete_sale("nope").await.unwrap_err();
        assert_eq!(missing.code, ErrorCode::NotFound);

        let blank = c.add_product(&ProductDraft::default()).await.unwrap_err();
        assert_eq!(blank.code, ErrorCode::ValidationError);
        assert!(blank.errors.len() > 1);

        // nothing changed, so nothing to re-render
        assert!(!c.poll().await);
    }

    #[tokio::test]
    async fn test_changes_from_other_handles_are_picked_up() {
        let mut c = seeded().await;
        c.navigate(View::Inventory).await;

        let other = c.app.clone();
        let scarf = product_id(&c, "Wool Scarf").await;
        other.inventory().restock(&scarf, 8).await.unwrap();

        assert!(c.poll().await);
        match c.current().unwrap() {
            ViewModel::Inventory(inv) => assert_eq!(inv.total_stock, 232),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_preview_and_serialized_shape() {
        let mut c = seeded().await;
        let tee = product_id(&c, "Printed Tee").await;

        let preview = c.preview_sale(&SaleRequest::new(&tee, 2)).await.unwrap();
        assert_eq!(preview.total.cents(), 4998);
        assert!(c.preview_sale(&SaleRequest::new("nope", 1)).await.is_none());

        let json = serde_json::to_value(c.navigate(View::Profits).await).unwrap();
        assert_eq!(json["view"], "profits");
        assert!(json["data"]["categories"].is_array());
    }
}
