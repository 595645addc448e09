//! # Domain Types
//!
//! Core domain types used throughout Stockroom.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │   SalePreview   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  product_id     │   │  unit_price     │       │
//! │  │  name           │   │  product_name   │   │  total / cost   │       │
//! │  │  category       │   │  quantity       │   │  profit         │       │
//! │  │  stock          │   │  price (snap)   │   │  can_sell       │       │
//! │  │  cost / price   │   │  cost  (snap)   │   └─────────────────┘       │
//! │  └─────────────────┘   └─────────────────┘                              │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │   │   StockLevel    │   │  ProductDraft   │       │
//! │  │  Shirts, Pants  │   │  High / Medium  │   │  ProductUpdate  │       │
//! │  │  Dresses, ...   │   │  Low  / Out     │   │  SaleRequest    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A Sale copies the product's name, price and cost at the moment it is
//! recorded. Later edits to the product (or deleting it) never change
//! historical revenue or profit.
//!
//! ## Storage Form
//! Every persisted type serializes with camelCase keys, money as integer
//! cents and timestamps as epoch milliseconds.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{self, ValidationReport};
use crate::{HIGH_STOCK_THRESHOLD, MAX_STOCK, MEDIUM_STOCK_THRESHOLD};

/// Current time truncated to millisecond precision.
///
/// Storage keeps epoch milliseconds, so anything finer would not survive a
/// save/load cycle.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

// =============================================================================
// Category
// =============================================================================

/// Product categories offered by the shop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Category {
    Shirts,
    Pants,
    Dresses,
    Jackets,
    Accessories,
}

impl Category {
    /// Every category, in menu order.
    pub const ALL: [Category; 5] = [
        Category::Shirts,
        Category::Pants,
        Category::Dresses,
        Category::Jackets,
        Category::Accessories,
    ];

    /// Display name, also the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Shirts => "Shirts",
            Category::Pants => "Pants",
            Category::Dresses => "Dresses",
            Category::Jackets => "Jackets",
            Category::Accessories => "Accessories",
        }
    }

    /// Display names of every category.
    pub fn names() -> Vec<String> {
        Category::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

// =============================================================================
// Stock Levels
// =============================================================================

/// Coarse stock bucket shown next to every product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum StockLevel {
    High,
    Medium,
    Low,
    Out,
}

/// Boundaries between stock levels.
///
/// ```text
///   0        1 ........ medium   medium+1 ...... high   high+1 ...
///   │        │             │        │              │      │
///   Out      └──── Low ────┘        └─── Medium ───┘      └── High
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StockThresholds {
    pub high: i64,
    pub medium: i64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        StockThresholds {
            high: HIGH_STOCK_THRESHOLD,
            medium: MEDIUM_STOCK_THRESHOLD,
        }
    }
}

impl StockThresholds {
    /// Buckets a stock count.
    pub fn level(&self, stock: i64) -> StockLevel {
        if stock > self.high {
            StockLevel::High
        } else if stock > self.medium {
            StockLevel::Medium
        } else if stock > 0 {
            StockLevel::Low
        } else {
            StockLevel::Out
        }
    }

    /// In stock, but at or below the medium boundary.
    pub fn is_low(&self, stock: i64) -> bool {
        stock > 0 && stock <= self.medium
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product held in inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Opaque identifier, assigned by the store on create.
    pub id: String,

    pub name: String,

    pub category: Category,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// Purchase cost per unit.
    pub cost: Money,

    /// Selling price per unit.
    pub price: Money,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub created_at: DateTime<Utc>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "chrono::serde::ts_milliseconds_option"
    )]
    #[ts(type = "number | null")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Creates a product without an id. The repository assigns one on create.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        stock: i64,
        cost: Money,
        price: Money,
        created_at: DateTime<Utc>,
    ) -> Self {
        Product {
            id: String::new(),
            name: name.into(),
            category,
            stock,
            cost,
            price,
            created_at,
            updated_at: None,
        }
    }

    /// Profit per unit.
    pub fn profit(&self) -> Money {
        self.price - self.cost
    }

    /// Profit as a percentage of price, 0 when price is 0.
    pub fn margin(&self) -> f64 {
        self.profit().percent_of(self.price)
    }

    pub fn stock_level(&self, thresholds: &StockThresholds) -> StockLevel {
        thresholds.level(self.stock)
    }

    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    pub fn is_low_stock(&self, thresholds: &StockThresholds) -> bool {
        thresholds.is_low(self.stock)
    }

    /// Cost of everything on hand.
    pub fn inventory_value(&self) -> Money {
        self.cost.multiply_quantity(self.stock)
    }

    /// Revenue if everything on hand sold at the current price.
    pub fn potential_revenue(&self) -> Money {
        self.price.multiply_quantity(self.stock)
    }

    /// Removes `quantity` units.
    ///
    /// ## Returns
    /// * `Ok(())` - Stock reduced
    /// * `Err(CoreError::InsufficientStock)` - Fewer than `quantity` on hand;
    ///   stock is left untouched
    pub fn reduce_stock(&mut self, quantity: i64) -> CoreResult<()> {
        if quantity > self.stock {
            return Err(CoreError::InsufficientStock {
                product: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        self.stock -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back on the shelf.
    ///
    /// ## Returns
    /// * `Ok(())` - Stock increased
    /// * `Err(CoreError::Validation)` - The result would exceed `MAX_STOCK`;
    ///   stock is left untouched
    pub fn add_stock(&mut self, quantity: i64) -> CoreResult<()> {
        match self.stock.checked_add(quantity) {
            Some(stock) if stock <= MAX_STOCK => {
                self.stock = stock;
                Ok(())
            }
            _ => Err(ValidationError::TooLarge {
                field: "stock".to_string(),
                max: MAX_STOCK.to_string(),
            }
            .into()),
        }
    }

    /// Merges `update` over this product, validates the result and returns
    /// the updated product. Identity and creation time are preserved.
    pub fn with_update(
        &self,
        update: &ProductUpdate,
        at: DateTime<Utc>,
    ) -> Result<Product, ValidationReport> {
        let mut updated = update.merged_into(self).build(at)?;
        updated.id = self.id.clone();
        updated.created_at = self.created_at;
        updated.updated_at = Some(at);
        Ok(updated)
    }
}

// =============================================================================
// Product Input
// =============================================================================

/// Product form input, before validation.
///
/// Numeric fields are optional because the form may leave them blank; a
/// blank number fails validation rather than defaulting to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub stock: Option<i64>,
    pub cost: Option<Money>,
    pub price: Option<Money>,
}

impl ProductDraft {
    /// Validates the draft and turns it into a product without an id.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Every rule passed
    /// * `Err(ValidationReport)` - All failed rules, in form order
    pub fn build(&self, at: DateTime<Utc>) -> Result<Product, ValidationReport> {
        let report = validation::validate_product(self);
        if !report.is_valid() {
            return Err(report);
        }
        match (self.category.parse::<Category>(), self.stock, self.cost, self.price) {
            (Ok(category), Some(stock), Some(cost), Some(price)) => Ok(Product::new(
                self.name.trim(),
                category,
                stock,
                cost,
                price,
                at,
            )),
            // validate_product rejects every other combination
            _ => Err(report),
        }
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        ProductDraft {
            name: product.name.clone(),
            category: product.category.to_string(),
            stock: Some(product.stock),
            cost: Some(product.cost),
            price: Some(product.price),
        }
    }
}

/// Partial product edit. Only the fields that are `Some` change.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub stock: Option<i64>,
    pub cost: Option<Money>,
    pub price: Option<Money>,
}

impl ProductUpdate {
    /// Stock-only edit, used by restock and manual adjustments.
    pub fn stock(stock: i64) -> Self {
        ProductUpdate {
            stock: Some(stock),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.cost.is_none()
            && self.price.is_none()
    }

    /// Field-by-field overlay of this update on `product`.
    pub fn merged_into(&self, product: &Product) -> ProductDraft {
        let base = ProductDraft::from(product);
        ProductDraft {
            name: self.name.clone().unwrap_or(base.name),
            category: self.category.clone().unwrap_or(base.category),
            stock: self.stock.or(base.stock),
            cost: self.cost.or(base.cost),
            price: self.price.or(base.price),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale.
///
/// ## Weak Product Reference
/// `product_id` may point at a product that has since been deleted.
/// Everything needed to report on the sale is copied in at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,

    /// Unit price at sale time.
    pub price: Money,

    /// Unit cost at sale time.
    pub cost: Money,

    #[serde(with = "chrono::serde::ts_milliseconds")]
    #[ts(type = "number")]
    pub date: DateTime<Utc>,
}

impl Sale {
    /// Captures a sale of `quantity` units of `product` at `date`.
    ///
    /// The id is left empty for the repository to assign.
    pub fn snapshot(product: &Product, quantity: i64, date: DateTime<Utc>) -> Self {
        Sale {
            id: String::new(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            price: product.price,
            cost: product.cost,
            date,
        }
    }

    /// Revenue of this sale.
    pub fn total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }

    pub fn total_cost(&self) -> Money {
        self.cost.multiply_quantity(self.quantity)
    }

    pub fn profit(&self) -> Money {
        self.total() - self.total_cost()
    }

    /// Profit as a percentage of total, 0 when total is 0.
    pub fn margin(&self) -> f64 {
        self.profit().percent_of(self.total())
    }

    pub fn profit_per_unit(&self) -> Money {
        self.price - self.cost
    }
}

/// Sale form input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(default, rename_all = "camelCase")]
#[ts(export)]
pub struct SaleRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl SaleRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        SaleRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// What a prospective sale would come to, without recording anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalePreview {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total: Money,
    pub cost: Money,
    pub profit: Money,
    pub available_stock: i64,
    pub can_sell: bool,
}

impl SalePreview {
    pub fn for_product(product: &Product, quantity: i64) -> Self {
        let total = product.price.multiply_quantity(quantity);
        let cost = product.cost.multiply_quantity(quantity);
        SalePreview {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity,
            unit_price: product.price,
            total,
            cost,
            profit: total - cost,
            available_stock: product.stock,
            can_sell: product.stock >= quantity,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 28, 10, 30, 0).unwrap()
    }

    fn product(stock: i64) -> Product {
        let mut p = Product::new(
            "Slim Fit Jeans",
            Category::Pants,
            stock,
            Money::from_cents(500),
            Money::from_cents(1000),
            at(),
        );
        p.id = "p-1".to_string();
        p
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("shirts".parse::<Category>().unwrap(), Category::Shirts);
        assert_eq!(" JACKETS ".parse::<Category>().unwrap(), Category::Jackets);
        assert!(matches!(
            "Hats".parse::<Category>(),
            Err(CoreError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_stock_levels_at_boundaries() {
        let t = StockThresholds::default();
        assert_eq!(t.level(31), StockLevel::High);
        assert_eq!(t.level(30), StockLevel::Medium);
        assert_eq!(t.level(11), StockLevel::Medium);
        assert_eq!(t.level(10), StockLevel::Low);
        assert_eq!(t.level(1), StockLevel::Low);
        assert_eq!(t.level(0), StockLevel::Out);

        assert!(t.is_low(10));
        assert!(!t.is_low(0));
        assert!(!t.is_low(11));
    }

    #[test]
    fn test_product_derived_values() {
        let p = product(10);
        assert_eq!(p.profit().cents(), 500);
        assert_eq!(p.margin(), 50.0);
        assert_eq!(p.inventory_value().cents(), 5000);
        assert_eq!(p.potential_revenue().cents(), 10000);
    }

    #[test]
    fn test_reduce_stock_never_goes_negative() {
        let mut p = product(10);
        p.reduce_stock(3).unwrap();
        assert_eq!(p.stock, 7);

        let err = p.reduce_stock(8).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product: "Slim Fit Jeans".to_string(),
                available: 7,
                requested: 8,
            }
        );
        assert_eq!(p.stock, 7);

        p.add_stock(3).unwrap();
        assert_eq!(p.stock, 10);

        assert!(p.add_stock(MAX_STOCK).is_err());
        assert!(p.add_stock(i64::MAX).is_err());
        assert_eq!(p.stock, 10);
        p.add_stock(MAX_STOCK - 10).unwrap();
        assert_eq!(p.stock, MAX_STOCK);
    }

    #[test]
    fn test_sale_snapshot_figures() {
        let p = product(10);
        let sale = Sale::snapshot(&p, 3, at());
        assert_eq!(sale.product_id, "p-1");
        assert_eq!(sale.total().cents(), 3000);
        assert_eq!(sale.total_cost().cents(), 1500);
        assert_eq!(sale.profit().cents(), 1500);
        assert_eq!(sale.margin(), 50.0);
        assert_eq!(sale.profit_per_unit().cents(), 500);
    }

    #[test]
    fn test_zero_total_has_zero_margin() {
        let mut p = product(10);
        p.price = Money::zero();
        p.cost = Money::zero();
        assert_eq!(p.margin(), 0.0);
        assert_eq!(Sale::snapshot(&p, 2, at()).margin(), 0.0);
    }

    #[test]
    fn test_product_storage_form() {
        let mut p = product(10);
        p.updated_at = None;
        let value = serde_json::to_value(&p).unwrap();
        assert_eq!(value["category"], "Pants");
        assert_eq!(value["cost"], 500);
        assert_eq!(value["createdAt"], at().timestamp_millis());
        assert!(value.get("updatedAt").is_none());

        let back: Product = serde_json::from_value(value).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn test_sale_storage_form_keeps_milliseconds() {
        let p = product(10);
        let date = timestamp_now();
        let sale = Sale::snapshot(&p, 1, date);
        let json = serde_json::to_string(&sale).unwrap();
        assert!(json.contains("\"productId\":\"p-1\""));
        let back: Sale = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sale);
    }

    #[test]
    fn test_draft_build() {
        let draft = ProductDraft {
            name: "  Printed Tee ".to_string(),
            category: "shirts".to_string(),
            stock: Some(52),
            cost: Some(Money::from_cents(1000)),
            price: Some(Money::from_cents(2499)),
        };
        let p = draft.build(at()).unwrap();
        assert_eq!(p.name, "Printed Tee");
        assert_eq!(p.category, Category::Shirts);
        assert!(p.id.is_empty());

        let bad = ProductDraft::default();
        assert!(bad.build(at()).is_err());
    }

    #[test]
    fn test_with_update_merges_and_keeps_identity() {
        let p = product(10);
        let later = at() + chrono::Duration::hours(1);
        let update = ProductUpdate {
            price: Some(Money::from_cents(1200)),
            ..Default::default()
        };
        let updated = p.with_update(&update, later).unwrap();
        assert_eq!(updated.id, "p-1");
        assert_eq!(updated.created_at, p.created_at);
        assert_eq!(updated.updated_at, Some(later));
        assert_eq!(updated.price.cents(), 1200);
        assert_eq!(updated.stock, 10);
        assert_eq!(updated.name, p.name);
    }

    #[test]
    fn test_with_update_revalidates_merged_result() {
        let p = product(10);
        let update = ProductUpdate {
            cost: Some(Money::from_cents(1500)),
            ..Default::default()
        };
        let report = p.with_update(&update, at()).unwrap_err();
        assert_eq!(report.messages(), vec!["price must be greater than cost"]);
    }

    #[test]
    fn test_sale_preview() {
        let p = product(2);
        let preview = SalePreview::for_product(&p, 3);
        assert_eq!(preview.total.cents(), 3000);
        assert_eq!(preview.cost.cents(), 1500);
        assert_eq!(preview.profit.cents(), 1500);
        assert_eq!(preview.available_stock, 2);
        assert!(!preview.can_sell);
        assert!(SalePreview::for_product(&p, 2).can_sell);
    }
}
