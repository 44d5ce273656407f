//! # Domain Types
//!
//! Core domain types used throughout Orderly.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Order      │   │  OrderDetail    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──┼─────────────────┼───│  product_id     │       │
//! │  │  name           │   │  id (UUID)      │◄──│  order_id       │       │
//! │  │  price_cents    │   │  date_time      │   │  quantity       │       │
//! │  │  currency       │   └─────────────────┘   └─────────────────┘       │
//! │  │  stock          │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Stock Accounting
//! Every `OrderDetail.quantity` is stock that has been moved out of
//! `Product.stock`. For any product:
//!
//! ```text
//! product.stock + Σ detail.quantity (all lines on that product) = physical inventory
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4), immutable.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Unit price in cents (smallest currency unit).
    pub price_cents: i64,

    /// ISO 4217 currency code of `price_cents`.
    pub currency: String,

    /// Units available for new reservations. Never negative.
    pub stock: i64,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` units can be reserved right now.
    #[inline]
    pub fn has_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }

    /// Takes `quantity` units out of stock.
    ///
    /// Leaves the product untouched and returns `InsufficientStock` if that
    /// would make stock negative.
    pub fn reserve(&mut self, quantity: i64) -> CoreResult<()> {
        if !self.has_stock(quantity) {
            return Err(CoreError::InsufficientStock {
                product_id: self.id.clone(),
                available: self.stock,
            });
        }

        self.stock -= quantity;
        Ok(())
    }

    /// Puts `quantity` units back into stock.
    ///
    /// Only fails with `Overflow` when the new stock cannot be represented;
    /// the product is left untouched in that case.
    pub fn release(&mut self, quantity: i64) -> CoreResult<()> {
        self.stock = self
            .stock
            .checked_add(quantity)
            .ok_or_else(|| CoreError::Overflow {
                what: "stock".to_string(),
            })?;
        Ok(())
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    /// Defaults to [`crate::DEFAULT_CURRENCY`] when omitted.
    #[serde(default = "default_currency")]
    pub currency: String,
    pub stock: i64,
}

impl NewProduct {
    /// Creates product input in the default currency.
    pub fn new(name: impl Into<String>, price_cents: i64, stock: i64) -> Self {
        NewProduct {
            name: name.into(),
            price_cents,
            currency: default_currency(),
            stock,
        }
    }
}

fn default_currency() -> String {
    crate::DEFAULT_CURRENCY.to_string()
}

// =============================================================================
// Order
// =============================================================================

/// An order. Owns its [`OrderDetail`] lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,

    /// Last-modified marker: set on creation, refreshed by every successful
    /// update.
    #[ts(as = "String")]
    pub date_time: DateTime<Utc>,
}

// =============================================================================
// Order Detail
// =============================================================================

/// One line of an order: `quantity` units of `product_id` reserved by
/// `order_id`. At most one line per product per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
}

/// Order line joined with the product it points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub currency: String,
}

impl LineItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price, or `Overflow` if that does not fit in cents.
    pub fn line_total(&self) -> CoreResult<Money> {
        self.unit_price()
            .checked_mul_quantity(self.quantity)
            .ok_or_else(|| CoreError::Overflow {
                what: "line total".to_string(),
            })
    }
}

// =============================================================================
// Requests
// =============================================================================

/// One caller-supplied `(product, quantity)` pair for register/update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

impl LineItemRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        LineItemRequest {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Stock movement needed to take an order line from one quantity to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Line grew: take this many more units out of stock.
    Reserve(i64),
    /// Line shrank: give this many units back.
    Release(i64),
    /// Same quantity, nothing moves.
    Unchanged,
}

impl StockAdjustment {
    /// Computes the movement from `existing` to `requested` units.
    pub fn between(existing: i64, requested: i64) -> Self {
        match requested.cmp(&existing) {
            std::cmp::Ordering::Greater => StockAdjustment::Reserve(requested - existing),
            std::cmp::Ordering::Less => StockAdjustment::Release(existing - requested),
            std::cmp::Ordering::Equal => StockAdjustment::Unchanged,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64) -> Product {
        Product {
            id: "p-1".to_string(),
            name: "product 1".to_string(),
            price_cents: 20_000,
            currency: "ARS".to_string(),
            stock,
        }
    }

    #[test]
    fn test_reserve_decrements_stock() {
        let mut p = product(10);
        p.reserve(4).unwrap();
        assert_eq!(p.stock, 6);

        // the whole remaining stock can be taken
        p.reserve(6).unwrap();
        assert_eq!(p.stock, 0);
    }

    #[test]
    fn test_reserve_rejects_overdraw_without_mutating() {
        let mut p = product(3);
        let err = p.reserve(5).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                product_id: "p-1".to_string(),
                available: 3,
            }
        );
        assert_eq!(p.stock, 3);
    }

    #[test]
    fn test_release_has_no_upper_bound() {
        let mut p = product(i64::from(u32::MAX));
        p.release(10).unwrap();
        assert_eq!(p.stock, i64::from(u32::MAX) + 10);
    }

    #[test]
    fn test_release_overflow_leaves_stock() {
        let mut p = product(i64::MAX);
        let err = p.release(1).unwrap_err();
        assert!(matches!(err, CoreError::Overflow { .. }));
        assert_eq!(p.stock, i64::MAX);
    }

    #[test]
    fn test_stock_adjustment_between() {
        assert_eq!(StockAdjustment::between(5, 2), StockAdjustment::Release(3));
        assert_eq!(StockAdjustment::between(5, 8), StockAdjustment::Reserve(3));
        assert_eq!(StockAdjustment::between(5, 5), StockAdjustment::Unchanged);
    }

    #[test]
    fn test_line_total() {
        let item = LineItem {
            id: "d-1".to_string(),
            order_id: "o-1".to_string(),
            product_id: "p-1".to_string(),
            quantity: 5,
            product_name: "product 1".to_string(),
            unit_price_cents: 20_000,
            currency: "ARS".to_string(),
        };
        assert_eq!(item.line_total().unwrap().cents(), 100_000);

        let huge = LineItem {
            quantity: 1_000_000,
            unit_price_cents: crate::MAX_PRICE_CENTS,
            ..item
        };
        assert!(matches!(
            huge.line_total(),
            Err(CoreError::Overflow { .. })
        ));
    }

    #[test]
    fn test_line_item_request_wire_format() {
        let req: LineItemRequest =
            serde_json::from_str(r#"{"productId":"p-1","quantity":5}"#).unwrap();
        assert_eq!(req, LineItemRequest::new("p-1", 5));
    }

    #[test]
    fn test_new_product_currency_defaults() {
        let p: NewProduct =
            serde_json::from_str(r#"{"name":"x","priceCents":100,"stock":1}"#).unwrap();
        assert_eq!(p.currency, crate::DEFAULT_CURRENCY);
    }
}
