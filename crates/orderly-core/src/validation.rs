//! # Validation Module
//!
//! Input validation for Orderly.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Request handler (external)                                   │
//! │  └── Deserialization into LineItemRequest / NewProduct                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (before any transaction opens)                   │
//! │  ├── 0 <= quantity <= MAX_QUANTITY on every item                       │
//! │  └── no product referenced twice                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity >= 0)                         │
//! │  ├── UNIQUE (order_id, product_id)                                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use orderly_core::types::LineItemRequest;
//! use orderly_core::validation::validate_line_items;
//!
//! let items = vec![LineItemRequest::new("a", 5), LineItemRequest::new("a", 1)];
//! assert!(validate_line_items(&items).is_err());
//! ```

use std::collections::HashSet;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{LineItemRequest, NewProduct};
use crate::{MAX_PRICE_CENTS, MAX_PRODUCT_NAME_LEN, MAX_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Line Item Validators
// =============================================================================

/// Validates an order line quantity.
///
/// ## Rules
/// - Must be zero or greater
/// - At most [`MAX_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
            value: qty,
        });
    }

    check_max("quantity", qty, MAX_QUANTITY)
}

fn check_max(field: &str, value: i64, max: i64) -> ValidationResult<()> {
    if value > max {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max,
            value,
        });
    }

    Ok(())
}

/// Returns every product id that appears more than once in `items`.
///
/// Each offending id is listed once, in the order it first appeared.
pub fn find_duplicate_products(items: &[LineItemRequest]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for item in items {
        let id = item.product_id.as_str();
        if !seen.insert(id) && reported.insert(id) {
            duplicates.push(id.to_string());
        }
    }

    duplicates
}

/// Validates the item list of a register or update call.
///
/// ## Order of Checks
/// 1. Every quantity (→ `CoreError::Validation`)
/// 2. Duplicate products (→ `CoreError::DuplicateProducts`)
///
/// An empty list is valid.
pub fn validate_line_items(items: &[LineItemRequest]) -> CoreResult<()> {
    for item in items {
        validate_quantity(item.quantity)?;
    }

    let product_ids = find_duplicate_products(items);
    if !product_ids.is_empty() {
        return Err(CoreError::DuplicateProducts { product_ids });
    }

    Ok(())
}

// =============================================================================
// Product Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed, up to [`MAX_PRICE_CENTS`].
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
            value: cents,
        });
    }

    check_max("price", cents, MAX_PRICE_CENTS)
}

/// Validates a stock level. Zero is allowed, up to [`MAX_QUANTITY`].
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::Negative {
            field: "stock".to_string(),
            value: stock,
        });
    }

    check_max("stock", stock, MAX_QUANTITY)
}

/// Validates an ISO 4217 currency code (three uppercase ASCII letters).
pub fn validate_currency(code: &str) -> ValidationResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three-letter ISO 4217 code".to_string(),
        });
    }

    Ok(())
}

/// Validates every field of a product about to be created or updated.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_product_name(&product.name)?;
    validate_price_cents(product.price_cents)?;
    validate_currency(&product.currency)?;
    validate_stock(product.stock)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
