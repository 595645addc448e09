//! # Service Error Type
//!
//! The single error type every service operation returns.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationReport ─────────────────────────► Validation   VALIDATION_ERROR
//! │  CoreError::ProductNotFound / SaleNotFound ─► NotFound     NOT_FOUND     │
//! │  CoreError::InsufficientStock ──────────────► InsufficientStock          │
//! │                                                            INSUFFICIENT_STOCK
//! │  DbError::NotFound ─────────────────────────► NotFound     NOT_FOUND     │
//! │  DbError::Domain(e) ────────────────────────► (as CoreError above)       │
//! │  DbError::{Transport, Remote, Query…} ──────► Storage      STORAGE_ERROR │
//! │        │                                                                │
//! │        └── logged with error!, UI sees a generic message                │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Form
//! ```json
//! { "code": "VALIDATION_ERROR", "errors": ["name is required", "price must be positive"] }
//! ```

use serde::Serialize;
use stockroom_core::{Category, CoreError, ValidationError, ValidationReport};
use stockroom_db::{DbError, DbResult};
use thiserror::Error;
use tracing::error;

/// Message shown for any storage or transport failure.
pub const STORAGE_FAILURE_MESSAGE: &str = "Storage operation failed";

/// Machine-readable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// User-correctable input problem; nothing was written.
    ValidationError,

    /// Referenced product or sale does not exist.
    NotFound,

    /// A stock adjustment would go below zero.
    InsufficientStock,

    /// Local serialization failure or remote call rejection.
    StorageError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InsufficientStock => "INSUFFICIENT_STOCK",
            ErrorCode::StorageError => "STORAGE_ERROR",
        }
    }
}

/// Failure of a service operation.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("Validation failed: {}", .0.messages().join("; "))]
    Validation(ValidationReport),

    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("Insufficient stock for {product}: {available} available, {requested} requested")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// The underlying cause has already been logged.
    #[error("{0}")]
    Storage(String),
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn product_not_found(id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: "Product".to_string(),
            id: id.into(),
        }
    }

    pub fn sale_not_found(id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: "Sale".to_string(),
            id: id.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Validation(_) => ErrorCode::ValidationError,
            ServiceError::NotFound { .. } => ErrorCode::NotFound,
            ServiceError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            ServiceError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Human-readable messages. Validation failures list every rule that
    /// failed; everything else is a single message.
    pub fn messages(&self) -> Vec<String> {
        match self {
            ServiceError::Validation(report) => report.messages(),
            other => vec![other.to_string()],
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code(),
            errors: self.messages(),
        }
    }
}

/// What the UI collaborator receives for a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub errors: Vec<String>,
}

impl From<&ServiceError> for ErrorResponse {
    fn from(err: &ServiceError) -> Self {
        err.to_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationReport> for ServiceError {
    fn from(report: ValidationReport) -> Self {
        ServiceError::Validation(report)
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(ValidationReport::single(err))
    }
}

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => ServiceError::product_not_found(id),
            CoreError::SaleNotFound(id) => ServiceError::sale_not_found(id),
            CoreError::InsufficientStock {
                product,
                available,
                requested,
            } => ServiceError::InsufficientStock {
                product,
                available,
                requested,
            },
            CoreError::UnknownCategory(_) => ValidationError::NotAllowed {
                field: "category".to_string(),
                allowed: Category::names(),
            }
            .into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            DbError::Domain(e) => e.into(),
            other => {
                // Log the actual error but return a generic message
                error!(error = %other, "Storage operation failed");
                ServiceError::Storage(STORAGE_FAILURE_MESSAGE.to_string())
            }
        }
    }
}

/// Read-path fallback: logs the failure and yields an empty value.
pub(crate) fn or_empty<T: Default>(result: DbResult<T>, operation: &'static str) -> T {
    result.unwrap_or_else(|e| {
        error!(operation, error = %e, "Read failed, returning empty result");
        T::default()
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
