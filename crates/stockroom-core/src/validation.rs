//! # Validation Module
//!
//! Business-rule validation for product and sale input.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Browser form                                                 │
//! │  └── Immediate feedback, field-level hints                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization (ProductDraft / SaleRequest)                 │
//! │  └── Shape and types                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  ├── Every rule is checked, failures are COLLECTED                     │
//! │  └── Nothing is written unless the report is empty                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockroom_core::types::SaleRequest;
//! use stockroom_core::validation::validate_sale;
//!
//! let report = validate_sale(&SaleRequest::new("p-1", 8), 7);
//! assert!(!report.is_valid());
//! assert!(report.messages()[0].contains("7 available"));
//! ```

use serde::Serialize;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Category, ProductDraft, SaleRequest};
use crate::{MAX_STOCK, MAX_UNIT_CENTS};

// =============================================================================
// Validation Report
// =============================================================================

/// Every rule that failed for one input, in check order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report with a single failure.
    pub fn single(error: ValidationError) -> Self {
        ValidationReport {
            errors: vec![error],
        }
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Human-readable messages for the form.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

impl From<ValidationError> for ValidationReport {
    fn from(error: ValidationError) -> Self {
        ValidationReport::single(error)
    }
}

// =============================================================================
// Product Validation
// =============================================================================

/// Validates product form input.
///
/// ## Rules
/// - name and category must be non-blank; category must name a known one
/// - stock must be present, zero or more, and at most `MAX_STOCK`
/// - cost and price must be present, positive, and at most `MAX_UNIT_CENTS`
/// - price must exceed cost (checked only when both are non-zero)
///
/// ## Example
/// ```rust
/// use stockroom_core::money::Money;
/// use stockroom_core::types::ProductDraft;
/// use stockroom_core::validation::validate_product;
///
/// let draft = ProductDraft {
///     name: "Wool Scarf".into(),
///     category: "Accessories".into(),
///     stock: Some(32),
///     cost: Some(Money::from_cents(1200)),
///     price: Some(Money::from_cents(2999)),
/// };
/// assert!(validate_product(&draft).is_valid());
/// ```
pub fn validate_product(draft: &ProductDraft) -> ValidationReport {
    let mut report = ValidationReport::new();

    if draft.name.trim().is_empty() {
        report.push(ValidationError::required("name"));
    }

    if draft.category.trim().is_empty() {
        report.push(ValidationError::required("category"));
    } else if draft.category.parse::<Category>().is_err() {
        report.push(ValidationError::NotAllowed {
            field: "category".to_string(),
            allowed: Category::names(),
        });
    }

    match draft.stock {
        Some(stock) if stock > MAX_STOCK => {
            report.push(ValidationError::too_large("stock", MAX_STOCK));
        }
        Some(stock) if stock >= 0 => {}
        _ => report.push(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        }),
    }

    check_unit_amount(&mut report, "cost", draft.cost);
    check_unit_amount(&mut report, "price", draft.price);

    if let (Some(cost), Some(price)) = (draft.cost, draft.price) {
        if !cost.is_zero() && !price.is_zero() && cost >= price {
            report.push(ValidationError::MustExceed {
                field: "price".to_string(),
                other: "cost".to_string(),
            });
        }
    }

    report
}

fn check_unit_amount(report: &mut ValidationReport, field: &str, amount: Option<Money>) {
    match amount {
        Some(amount) if amount.cents() > MAX_UNIT_CENTS => {
            report.push(ValidationError::too_large(field, Money::from_cents(MAX_UNIT_CENTS)));
        }
        Some(amount) if amount.is_positive() => {}
        _ => report.push(ValidationError::must_be_positive(field)),
    }
}

// =============================================================================
// Sale Validation
// =============================================================================

/// Validates a sale request against the stock currently on hand.
///
/// ## Rules
/// - a product must be selected
/// - quantity must be positive and at most `MAX_STOCK`
/// - a non-zero quantity must not exceed `available`
pub fn validate_sale(request: &SaleRequest, available: i64) -> ValidationReport {
    let mut report = ValidationReport::new();

    if request.product_id.trim().is_empty() {
        report.push(ValidationError::required("productId"));
    }

    if request.quantity <= 0 {
        report.push(ValidationError::must_be_positive("quantity"));
    } else if request.quantity > MAX_STOCK {
        report.push(ValidationError::too_large("quantity", MAX_STOCK));
    }

    if request.quantity != 0 && request.quantity > available {
        report.push(ValidationError::InsufficientStock {
            available,
            requested: request.quantity,
        });
    }

    report
}

// =============================================================================
// Unit Tests
// =============================================================================
