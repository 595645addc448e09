//! # Analytics
//!
//! Read-only folds over the full sale list (joined with the product list
//! where a category or stock figure is needed).
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   &[Sale] ──┬──► summarize()            revenue / costs / profit       │
//! │             ├──► top_products(n)        group by product, by revenue   │
//! │             ├──► sales_trend(days)      calendar-day buckets (UTC)     │
//! │             │                                                           │
//! │   &[Product]┼──► profits_by_category()  join on product_id             │
//! │             ├──► product_profitability()                               │
//! │             └──► performance_metrics()                                 │
//! │                                                                         │
//! │   Nothing is cached: every call recomputes from the slices it is given │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All money sums are exact integer cents, so
//! `summary.profit == summary.revenue - summary.costs` always holds.
//! Groupings keep first-encounter order and every sort is stable, so ties
//! come out in the order the sales were recorded.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Category, Product, Sale, StockThresholds};
use crate::{MAX_TREND_DAYS, UNKNOWN_CATEGORY};

// =============================================================================
// Report Types
// =============================================================================

/// Revenue, cost and profit over a set of sales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub revenue: Money,
    pub costs: Money,
    pub profit: Money,
    /// Profit as a percentage of revenue; 0 with no revenue.
    pub average_margin: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub revenue: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryProfit {
    pub category: Category,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    /// Number of sales, not units.
    pub sales: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductProfitability {
    pub product_id: String,
    pub product_name: String,
    /// Current category, or "N/A" when the product has been deleted.
    pub category: String,
    pub units_sold: i64,
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    pub margin: f64,
}

/// One calendar day of the sales trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TrendPoint {
    /// ISO date, `YYYY-MM-DD`.
    #[ts(type = "string")]
    pub date: NaiveDate,
    pub sales: u64,
    pub revenue: Money,
    pub profit: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PerformanceMetrics {
    pub total_products: usize,
    pub total_sales: usize,
    pub average_sale_value: Money,
    pub average_units_per_sale: f64,
    pub low_stock_products: usize,
    pub out_of_stock_products: usize,
}

/// Everything the dashboard shows.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardStats {
    /// Sum of stock over all products.
    pub total_inventory: i64,
    pub total_revenue: Money,
    pub total_profit: Money,
    pub average_margin: f64,
    pub top_products: Vec<TopProduct>,
    pub recent_sales: Vec<Sale>,
}

// =============================================================================
// Totals
// =============================================================================

pub fn total_revenue(sales: &[Sale]) -> Money {
    sales.iter().map(Sale::total).sum()
}

pub fn total_costs(sales: &[Sale]) -> Money {
    sales.iter().map(Sale::total_cost).sum()
}

pub fn total_profit(sales: &[Sale]) -> Money {
    total_revenue(sales) - total_costs(sales)
}

/// Profit as a percentage of revenue, 0 when there is no revenue.
pub fn average_margin(sales: &[Sale]) -> f64 {
    total_profit(sales).percent_of(total_revenue(sales))
}

/// All four totals in one pass.
pub fn summarize(sales: &[Sale]) -> SalesSummary {
    let (revenue, costs) = sales
        .iter()
        .fold((Money::zero(), Money::zero()), |(r, c), sale| {
            (r + sale.total(), c + sale.total_cost())
        });
    let profit = revenue - costs;
    SalesSummary {
        revenue,
        costs,
        profit,
        average_margin: profit.percent_of(revenue),
    }
}

// =============================================================================
// Rankings
// =============================================================================

/// Groups sales by product and ranks by revenue, highest first.
///
/// Name comes from the first sale seen for each product.
pub fn top_products(sales: &[Sale], limit: usize) -> Vec<TopProduct> {
    let mut groups: Vec<TopProduct> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sale in sales {
        let slot = *index.entry(sale.product_id.as_str()).or_insert_with(|| {
            groups.push(TopProduct {
                product_id: sale.product_id.clone(),
                product_name: sale.product_name.clone(),
                quantity: 0,
                revenue: Money::zero(),
                profit: Money::zero(),
            });
            groups.len() - 1
        });
        let entry = &mut groups[slot];
        entry.quantity += sale.quantity;
        entry.revenue += sale.total();
        entry.profit += sale.profit();
    }

    groups.sort_by(|a, b| b.revenue.cmp(&a.revenue));
    groups.truncate(limit);
    groups
}

/// Profit per category, highest first.
///
/// Sales whose product no longer exists have no category and are left out.
pub fn profits_by_category(sales: &[Sale], products: &[Product]) -> Vec<CategoryProfit> {
    let categories: HashMap<&str, Category> = products
        .iter()
        .map(|p| (p.id.as_str(), p.category))
        .collect();

    let mut groups: Vec<CategoryProfit> = Vec::new();
    for sale in sales {
        let Some(&category) = categories.get(sale.product_id.as_str()) else {
            continue;
        };
        let position = match groups.iter().position(|g| g.category == category) {
            Some(position) => position,
            None => {
                groups.push(CategoryProfit {
                    category,
                    revenue: Money::zero(),
                    cost: Money::zero(),
                    profit: Money::zero(),
                    sales: 0,
                });
                groups.len() - 1
            }
        };
        let entry = &mut groups[position];
        entry.revenue += sale.total();
        entry.cost += sale.total_cost();
        entry.profit += sale.profit();
        entry.sales += 1;
    }

    groups.sort_by(|a, b| b.profit.cmp(&a.profit));
    groups
}

/// Per-product profitability, highest profit first.
pub fn product_profitability(sales: &[Sale], products: &[Product]) -> Vec<ProductProfitability> {
    let by_id: HashMap<&str, &Product> = products.iter().map(|p| (p.id.as_str(), p)).collect();

    let mut rows: Vec<ProductProfitability> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for sale in sales {
        let slot = *index.entry(sale.product_id.as_str()).or_insert_with(|| {
            let category = by_id
                .get(sale.product_id.as_str())
                .map(|p| p.category.to_string())
                .unwrap_or_else(|| UNKNOWN_CATEGORY.to_string());
            rows.push(ProductProfitability {
                product_id: sale.product_id.clone(),
                product_name: sale.product_name.clone(),
                category,
                units_sold: 0,
                revenue: Money::zero(),
                cost: Money::zero(),
                profit: Money::zero(),
                margin: 0.0,
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];
        row.units_sold += sale.quantity;
        row.revenue += sale.total();
        row.cost += sale.total_cost();
        row.profit += sale.profit();
    }

    for row in &mut rows {
        row.margin = row.profit.percent_of(row.revenue);
    }
    rows.sort_by(|a, b| b.profit.cmp(&a.profit));
    rows
}

/// The `limit` most recent sales, newest first.
pub fn recent_sales(sales: &[Sale], limit: usize) -> Vec<Sale> {
    let mut sorted = sales.to_vec();
    sorted.sort_by(|a, b| b.date.cmp(&a.date));
    sorted.truncate(limit);
    sorted
}

// =============================================================================
// Trend & Metrics
// =============================================================================

/// Daily buckets for the `days` calendar days ending at `today`, oldest first.
///
/// Days without sales stay at zero. Sales outside the window are ignored.
/// Dates are taken in UTC. `days` is clamped to [`MAX_TREND_DAYS`], and days
/// before the earliest representable date are left out.
pub fn sales_trend(sales: &[Sale], days: u32, today: NaiveDate) -> Vec<TrendPoint> {
    let mut points: Vec<TrendPoint> = (0..days.min(MAX_TREND_DAYS))
        .rev()
        .filter_map(|back| today.checked_sub_days(Days::new(back.into())))
        .map(|date| TrendPoint {
            date,
            sales: 0,
            revenue: Money::zero(),
            profit: Money::zero(),
        })
        .collect();

    let index: HashMap<NaiveDate, usize> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (p.date, i))
        .collect();

    for sale in sales {
        if let Some(&i) = index.get(&sale.date.date_naive()) {
            let point = &mut points[i];
            point.sales += 1;
            point.revenue += sale.total();
            point.profit += sale.profit();
        }
    }

    points
}

pub fn performance_metrics(
    sales: &[Sale],
    products: &[Product],
    thresholds: &StockThresholds,
) -> PerformanceMetrics {
    let count = sales.len();
    let units: i64 = sales.iter().map(|s| s.quantity).sum();
    let average_units_per_sale = if count == 0 {
        0.0
    } else {
        units as f64 / count as f64
    };

    PerformanceMetrics {
        total_products: products.len(),
        total_sales: count,
        average_sale_value: total_revenue(sales).divide_rounded(count as i64),
        average_units_per_sale,
        low_stock_products: products.iter().filter(|p| p.is_low_stock(thresholds)).count(),
        out_of_stock_products: products.iter().filter(|p| !p.is_in_stock()).count(),
    }
}

/// Dashboard bundle: stock on hand, totals, top products and latest sales.
pub fn dashboard_stats(
    sales: &[Sale],
    products: &[Product],
    top: usize,
    recent: usize,
) -> DashboardStats {
    let summary = summarize(sales);
    DashboardStats {
        total_inventory: products.iter().map(|p| p.stock).sum(),
        total_revenue: summary.revenue,
        total_profit: summary.profit,
        average_margin: summary.average_margin,
        top_products: top_products(sales, top),
        recent_sales: recent_sales(sales, recent),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
