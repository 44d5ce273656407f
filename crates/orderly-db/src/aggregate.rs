//! # Order Aggregate
//!
//! One order and its detail lines, kept in step with product stock.
//!
//! Every line change goes through the [`InventoryLedger`] first: a line is
//! only written after the matching reservation succeeded, and a line is only
//! removed after its units were released.
//!
//! ```text
//! add_line(P, 3)      reserve(P, 3)          → INSERT detail (P, 3)
//! adjust_line(P, 5)   reserve/release(P, Δ)  → UPDATE detail SET quantity = 5
//! delete()            release(P, q) per line → DELETE detail ... → DELETE order
//! ```
//!
//! The aggregate works on a connection handed in by the caller and never
//! commits; see [`crate::coordinator`] for the transaction boundary.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::ledger::InventoryLedger;
use crate::repository::order::OrderRepository;
use crate::repository::product::ProductRepository;
use orderly_core::{CoreError, LineItem, Money, Order, OrderDetail, Product, StockAdjustment};

/// A loaded order, ready to have its lines changed.
#[derive(Debug, Clone)]
pub struct OrderAggregate {
    order: Order,
}

impl OrderAggregate {
    /// Loads an existing order.
    ///
    /// Fails with `OrderNotFound` if there is no such order.
    pub async fn load(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Self> {
        let order = OrderRepository::fetch(conn, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        Ok(OrderAggregate { order })
    }

    /// Creates a new order with no lines.
    pub async fn create(conn: &mut SqliteConnection) -> DbResult<Self> {
        let order = OrderRepository::insert(conn).await?;
        Ok(OrderAggregate { order })
    }

    pub fn id(&self) -> &str {
        &self.order.id
    }

    pub fn into_order(self) -> Order {
        self.order
    }

    /// Reserves `quantity` units of a product and records the line.
    pub async fn add_line(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderDetail> {
        let mut product = load_product(conn, product_id).await?;

        InventoryLedger::reserve(conn, &mut product, quantity).await?;
        let detail = OrderRepository::insert_detail(conn, self.id(), product_id, quantity).await?;

        debug!(order_id = %self.id(), product_id = %product_id, quantity, "Line added");
        Ok(detail)
    }

    /// Moves an existing line to `quantity` units.
    ///
    /// The line's current reservation counts as available, so a line holding
    /// 5 units of a product with 3 left in stock can grow up to 8.
    ///
    /// ## Errors
    /// - `LineItemNotFound` if the order has no line for the product
    /// - `InsufficientStock { available: stock + current quantity }`
    pub async fn adjust_line(
        &self,
        conn: &mut SqliteConnection,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderDetail> {
        let mut detail = OrderRepository::find_detail(conn, self.id(), product_id)
            .await?
            .ok_or_else(|| CoreError::LineItemNotFound {
                order_id: self.id().to_string(),
                product_id: product_id.to_string(),
            })?;
        let mut product = load_product(conn, product_id).await?;

        let available = product
            .stock
            .checked_add(detail.quantity)
            .ok_or_else(|| CoreError::Overflow {
                what: "available stock".to_string(),
            })?;
        if available < quantity {
            return Err(CoreError::InsufficientStock {
                product_id: product_id.to_string(),
                available,
            }
            .into());
        }

        let adjustment = StockAdjustment::between(detail.quantity, quantity);
        InventoryLedger::adjust(conn, &mut product, adjustment)
            .await
            .map_err(|err| include_reservation(err, detail.quantity))?;

        if adjustment != StockAdjustment::Unchanged {
            OrderRepository::set_detail_quantity(conn, &detail.id, quantity).await?;
        }

        debug!(
            order_id = %self.id(),
            product_id = %product_id,
            from = detail.quantity,
            to = quantity,
            "Line adjusted"
        );

        detail.quantity = quantity;
        Ok(detail)
    }

    /// Lines of this order with product name and price.
    pub async fn line_items(&self, conn: &mut SqliteConnection) -> DbResult<Vec<LineItem>> {
        OrderRepository::line_items_for(conn, self.id()).await
    }

    /// Σ quantity × unit price over every line.
    ///
    /// Fails with `Overflow` rather than wrapping when a line or the sum does
    /// not fit in cents.
    pub async fn total_cost(&self, conn: &mut SqliteConnection) -> DbResult<Money> {
        let items = self.line_items(conn).await?;
        let totals = items
            .iter()
            .map(LineItem::line_total)
            .collect::<Result<Vec<_>, _>>()?;

        let total = Money::checked_sum(totals).ok_or_else(|| CoreError::Overflow {
            what: "order total".to_string(),
        })?;
        Ok(total)
    }

    /// Marks the order as modified now.
    pub async fn touch(&mut self, conn: &mut SqliteConnection) -> DbResult<()> {
        self.order = OrderRepository::touch(conn, self.id())
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(self.order.id.clone()))?;
        Ok(())
    }

    /// Releases every line's stock, removes the lines, then the order.
    pub async fn delete(self, conn: &mut SqliteConnection) -> DbResult<()> {
        let details = OrderRepository::details_for(conn, self.id()).await?;

        for detail in &details {
            let mut product = load_product(conn, &detail.product_id).await?;
            InventoryLedger::release(conn, &mut product, detail.quantity).await?;
            OrderRepository::delete_detail(conn, &detail.id).await?;
        }

        if !OrderRepository::delete(conn, self.id()).await? {
            return Err(CoreError::OrderNotFound(self.order.id).into());
        }

        debug!(order_id = %self.order.id, lines = details.len(), "Order deleted");
        Ok(())
    }
}

async fn load_product(conn: &mut SqliteConnection, product_id: &str) -> DbResult<Product> {
    let product = ProductRepository::fetch(conn, product_id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;
    Ok(product)
}

/// Counts the units a line already holds as available.
fn include_reservation(err: DbError, held: i64) -> DbError {
    match err {
        DbError::Domain(CoreError::InsufficientStock {
            product_id,
            available,
        }) => CoreError::InsufficientStock {
            product_id,
            available: available.saturating_add(held),
        }
        .into(),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
