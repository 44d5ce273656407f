//! # Error Types
//!
//! Domain-specific error types for orderly-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  orderly-core errors (this file)                                       │
//! │  ├── CoreError        - Order/inventory rule violations                │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── ErrorCode        - What the caller sees (one code per kind)       │
//! │                                                                         │
//! │  orderly-db errors (separate crate)                                    │
//! │  └── DbError          - Storage failures, carries CoreError            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ErrorCode → Caller      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product id, order id)
//! 3. Errors are enum variants, never String
//! 4. Each error kind maps to a distinct [`ErrorCode`]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Core Error
// =============================================================================

/// Order and inventory rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Order cannot be found.
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// The order has no line for this product.
    ///
    /// ## When This Occurs
    /// - Updating an order with a product it was never registered with.
    ///   Updates only adjust existing lines, they never add new ones.
    ///
    /// Callers see it as a plain not-found, like [`CoreError::ProductNotFound`].
    #[error("Product {product_id} is not part of order {order_id}")]
    LineItemNotFound {
        order_id: String,
        product_id: String,
    },

    /// The same product was referenced more than once in one call.
    #[error("Duplicate products were detected: {}", product_ids.join(", "))]
    DuplicateProducts { product_ids: Vec<String> },

    /// Applying the item would drive stock below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// register [(A, 5), (B, 5)]     A.stock = 10, B.stock = 3
    ///      │
    ///      ▼
    /// A: 10 >= 5 → reserve
    /// B:  3 <  5 → InsufficientStock { product_id: B, available: 3 }
    ///      │
    ///      ▼
    /// Roll back: A.stock is 10 again, no order exists
    /// ```
    #[error("Insufficient stock for product {product_id}: available {available}")]
    InsufficientStock { product_id: String, available: i64 },

    /// An amount or stock count no longer fits in 64 bits.
    #[error("{what} is too large to represent")]
    Overflow { what: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Returns the caller-facing code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CoreError::ProductNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::LineItemNotFound { .. } => ErrorCode::NotFound,
            CoreError::DuplicateProducts { .. } => ErrorCode::DuplicateProducts,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::Overflow { .. } | CoreError::Validation(_) => ErrorCode::ValidationError,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage interaction, so they never need a rollback.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be zero or greater.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: i64 },

    /// Value exceeds the largest accepted value.
    #[error("{field} must be at most {max} (got {value})")]
    TooLarge { field: String, max: i64, value: i64 },

    /// Invalid format (e.g., invalid currency code or exchange rate).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Error Codes
// =============================================================================

/// Machine-readable error codes handed to callers.
///
/// ## Serialization
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for product ..." }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Order, product or order line not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Same product referenced twice in one call (400)
    DuplicateProducts,

    /// Stock would go negative (400)
    InsufficientStock,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal error (500)
    Internal,
}

impl ErrorCode {
    /// HTTP status a request handler should answer with.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError
            | ErrorCode::DuplicateProducts
            | ErrorCode::InsufficientStock => 400,
            ErrorCode::DatabaseError | ErrorCode::Internal => 500,
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
            product_id: "p-1".to_string(),
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for product p-1: available 3"
        );

        let err = CoreError::DuplicateProducts {
            product_ids: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(err.to_string(), "Duplicate products were detected: a, b");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Negative {
            field: "quantity".to_string(),
            value: -2,
        };
        assert_eq!(err.to_string(), "quantity must not be negative (got -2)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.code(), ErrorCode::ValidationError);
    }

    #[test]
    fn test_line_item_not_found_reads_as_not_found() {
        let missing_line = CoreError::LineItemNotFound {
            order_id: "o".to_string(),
            product_id: "p".to_string(),
        };
        let missing_product = CoreError::ProductNotFound("p".to_string());
        assert_eq!(missing_line.code(), missing_product.code());
        assert_eq!(missing_line.code().http_status(), 404);
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::InsufficientStock).unwrap();
        assert_eq!(json, "\"INSUFFICIENT_STOCK\"");
    }
}
