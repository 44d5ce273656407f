//! # Inventory Ledger
//!
//! The only code that changes `products.stock`.
//!
//! ## Reserve / Release
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  reserve(P, 3)                       release(P, 3)                      │
//! │     │                                   │                               │
//! │     ▼                                   ▼                               │
//! │  P.stock >= 3 ?  ── no ──► InsufficientStock { available: P.stock }    │
//! │     │ yes                               │                               │
//! │     ▼                                   ▼                               │
//! │  P.stock -= 3 (in memory)            P.stock += 3 (in memory)           │
//! │     │                                   │                               │
//! │     ▼                                   ▼                               │
//! │  guarded UPDATE (stock - 3 >= 0)     UPDATE (stock + 3)                 │
//! │     │                                                                   │
//! │     └── guard miss → re-read row → InsufficientStock { fresh stock }   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger never opens a transaction. Callers run several ledger calls
//! on one transaction connection and commit or roll back as a unit.

use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use orderly_core::{CoreError, Product, StockAdjustment};

/// Stock reservations and releases against single product rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryLedger;

impl InventoryLedger {
    /// Takes `quantity` units of `product` out of stock and persists it.
    ///
    /// ## Errors
    /// - `InsufficientStock` when `product.stock < quantity`, or when the row
    ///   changed underneath the caller and no longer has enough. `product` is
    ///   refreshed from the row in the second case.
    /// - `ProductNotFound` if the row vanished.
    pub async fn reserve(
        conn: &mut SqliteConnection,
        product: &mut Product,
        quantity: i64,
    ) -> DbResult<()> {
        product.reserve(quantity)?;

        if ProductRepository::persist_stock(conn, &product.id, -quantity).await? {
            debug!(product_id = %product.id, quantity, stock = product.stock, "Reserved stock");
            return Ok(());
        }

        // The row no longer matches what was loaded
        let fresh = ProductRepository::fetch(conn, &product.id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product.id.clone()))?;

        warn!(
            product_id = %product.id,
            quantity,
            available = fresh.stock,
            "Stock changed before reservation was written"
        );

        *product = fresh;
        Err(CoreError::InsufficientStock {
            product_id: product.id.clone(),
            available: product.stock,
        }
        .into())
    }

    /// Puts `quantity` units of `product` back into stock and persists it.
    ///
    /// Never fails for lack of stock. Fails with `ProductNotFound` if the row
    /// is gone, or `Overflow` if the new stock cannot be represented; nothing
    /// is written in either case.
    pub async fn release(
        conn: &mut SqliteConnection,
        product: &mut Product,
        quantity: i64,
    ) -> DbResult<()> {
        let mut released = product.clone();
        released.release(quantity)?;

        if !ProductRepository::persist_stock(conn, &product.id, quantity).await? {
            return Err(CoreError::ProductNotFound(product.id.clone()).into());
        }

        *product = released;
        debug!(product_id = %product.id, quantity, stock = product.stock, "Released stock");
        Ok(())
    }

    /// Applies a precomputed [`StockAdjustment`].
    pub async fn adjust(
        conn: &mut SqliteConnection,
        product: &mut Product,
        adjustment: StockAdjustment,
    ) -> DbResult<()> {
        match adjustment {
            StockAdjustment::Reserve(quantity) => Self::reserve(conn, product, quantity).await,
            StockAdjustment::Release(quantity) => Self::release(conn, product, quantity).await,
            StockAdjustment::Unchanged => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
