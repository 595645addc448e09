//! # Error Types
//!
//! Domain-specific error types for stockroom-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  stockroom-core errors (this file)                                     │
//! │  ├── CoreError        - General domain errors                          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  stockroom-db errors (separate crate)                                  │
//! │  └── DbError          - Storage / transport failures                   │
//! │                                                                         │
//! │  stockroom-service errors                                              │
//! │  └── ServiceError     - What the UI sees (code + messages)             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ServiceError → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Removing stock would take the product below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Sell (qty: 8)
    ///      │
    ///      ▼
    /// Check stock: available=7
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Jeans", available: 7, requested: 8 }
    ///      │
    ///      ▼
    /// UI shows: "Insufficient stock for Jeans: 7 available, 8 requested"
    /// ```
    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Category text does not name a known category.
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Each one renders as a single human-readable line for the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} must be a non-negative integer")]
    MustNotBeNegative { field: String },

    /// One field must be strictly greater than another.
    #[error("{field} must be greater than {other}")]
    MustExceed { field: String, other: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {}", allowed.join(", "))]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Value is above the largest amount the inventory accepts.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Requested quantity exceeds what is on hand.
    #[error("Insufficient stock: only {available} available, {requested} requested")]
    InsufficientStock { available: i64, requested: i64 },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub(crate) fn too_large(field: &str, max: impl ToString) -> Self {
        ValidationError::TooLarge {
            field: field.to_string(),
            max: max.to_string(),
        }
    }

    pub(crate) fn must_be_positive(field: &str) -> Self {
        ValidationError::MustBePositive {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            product: "Slim Fit Jeans".to_string(),
            available: 7,
            requested: 8,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Slim Fit Jeans: 7 available, 8 requested"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");

        let err = ValidationError::MustExceed {
            field: "price".to_string(),
            other: "cost".to_string(),
        };
        assert_eq!(err.to_string(), "price must be greater than cost");

        let err = ValidationError::NotAllowed {
            field: "category".to_string(),
            allowed: vec!["Shirts".to_string(), "Pants".to_string()],
        };
        assert_eq!(err.to_string(), "category must be one of: Shirts, Pants");

        let err = ValidationError::InsufficientStock {
            available: 7,
            requested: 8,
        };
        assert!(err.to_string().contains("7 available"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("product").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
