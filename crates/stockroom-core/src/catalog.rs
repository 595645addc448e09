//! Sample catalog and sales history loaded into an empty store on first start.

use chrono::{DateTime, TimeZone, Utc};

use crate::money::Money;
use crate::types::{Category, Product, Sale};

/// (name, category, stock, cost cents, price cents)
const SAMPLE_PRODUCTS: [(&str, Category, i64, i64, i64); 8] = [
    ("Basic White Tee", Category::Shirts, 45, 850, 1999),
    ("Slim Fit Jeans", Category::Pants, 28, 2500, 5999),
    ("Floral Summer Dress", Category::Dresses, 15, 3000, 7999),
    ("Leather Jacket", Category::Jackets, 8, 8000, 19999),
    ("Wool Scarf", Category::Accessories, 32, 1200, 2999),
    ("Printed Tee", Category::Shirts, 52, 1000, 2499),
    ("Track Pants", Category::Pants, 38, 1800, 4499),
    ("Evening Gown", Category::Dresses, 6, 6000, 14999),
];

/// The sample products, without ids, all created at `at`.
pub fn sample_products(at: DateTime<Utc>) -> Vec<Product> {
    SAMPLE_PRODUCTS
        .iter()
        .map(|&(name, category, stock, cost, price)| {
            Product::new(
                name,
                category,
                stock,
                Money::from_cents(cost),
                Money::from_cents(price),
                at,
            )
        })
        .collect()
}

/// (product name, quantity, year, month, day)
const SAMPLE_SALES: [(&str, i64, i32, u32, u32); 5] = [
    ("Basic White Tee", 5, 2025, 12, 28),
    ("Slim Fit Jeans", 3, 2025, 12, 28),
    ("Floral Summer Dress", 2, 2025, 12, 29),
    ("Wool Scarf", 4, 2025, 12, 29),
    ("Printed Tee", 7, 2025, 12, 30),
];

/// Sample sales against `products`, matched by name, dated at UTC midnight.
///
/// Entries whose product is not in `products` are skipped. The sales are
/// history only: they do not take stock off the products.
pub fn sample_sales(products: &[Product]) -> Vec<Sale> {
    SAMPLE_SALES
        .iter()
        .filter_map(|&(name, quantity, year, month, day)| {
            let product = products.iter().find(|p| p.name == name)?;
            let date = Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).single()?;
            Some(Sale::snapshot(product, quantity, date))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProductDraft;
    use crate::validation::validate_product;

    #[test]
    fn test_sample_products_are_valid() {
        let products = sample_products(Utc::now());
        assert_eq!(products.len(), 8);
        for p in &products {
            assert!(validate_product(&ProductDraft::from(p)).is_valid(), "{}", p.name);
        }
    }

    #[test]
    fn test_sample_sales_snapshot_products() {
        let products = sample_products(Utc::now());
        let sales = sample_sales(&products);
        assert_eq!(sales.len(), 5);
        assert_eq!(sales[0].product_name, "Basic White Tee");
        assert_eq!(sales[0].price.cents(), 1999);
        assert_eq!(sales[4].quantity, 7);

        // Missing products are skipped
        assert_eq!(sample_sales(&products[..2]).len(), 2);
    }
}
