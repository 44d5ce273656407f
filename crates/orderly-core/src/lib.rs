//! # orderly-core: Pure Business Logic for Orderly
//!
//! This crate holds the order and inventory rules as pure functions with
//! zero I/O dependencies. Everything that touches storage lives in
//! `orderly-db`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderly Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Request handler (HTTP, auth) - external            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ register / update / delete            │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        orderly-db: OrderCoordinator (one transaction/call)      │   │
//! │  │        OrderAggregate ──► InventoryLedger ──► SQLite            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure rules                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ orderly-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   error   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ CoreError │  │ quantities│  │   │
//! │  │   │   Order   │  │ Exchange  │  │ ErrorCode │  │ duplicates│  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Order, OrderDetail, line items)
//! - [`money`] - Money type with integer arithmetic and currency conversion
//! - [`error`] - Domain error types and caller-facing error codes
//! - [`validation`] - Input validation, including duplicate product detection
//!
//! ## Example Usage
//!
//! ```rust
//! use orderly_core::types::StockAdjustment;
//!
//! // A line edited from 5 units down to 2 gives 3 units back to stock
//! assert_eq!(StockAdjustment::between(5, 2), StockAdjustment::Release(3));
//!
//! // ...and edited from 5 up to 8 takes 3 more
//! assert_eq!(StockAdjustment::between(5, 8), StockAdjustment::Reserve(3));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorCode, ValidationError};
pub use money::{ExchangeRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency assigned to products created without one.
pub const DEFAULT_CURRENCY: &str = "ARS";

/// Maximum length of a product name.
pub const MAX_PRODUCT_NAME_LEN: usize = 200;

/// Largest stock count or line quantity accepted from callers.
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

/// Largest unit price in cents: 999,999,999,999.99.
pub const MAX_PRICE_CENTS: i64 = 99_999_999_999_999;
