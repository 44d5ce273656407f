//! # Order Repository
//!
//! Database operations for orders and their detail lines.
//!
//! ## Two Kinds of Methods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  &self methods (pool)             associated fns (conn)                 │
//! │  ───────────────────              ─────────────────────                 │
//! │  get_by_id, list, count,          insert, touch, delete,                │
//! │  line_items                       insert_detail, find_detail, ...       │
//! │       │                                  │                              │
//! │       ▼                                  ▼                              │
//! │  any free pooled connection       the coordinator's open transaction    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes to orders only happen through the connection-level functions, so
//! every order mutation lands inside a transaction the coordinator owns.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use orderly_core::{LineItem, Order, OrderDetail};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Pool-level reads
    // =========================================================================

    /// Gets an order by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    /// Lists orders, oldest `date_time` first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, date_time FROM orders ORDER BY date_time, rowid LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Lists the line items of one order joined with their products.
    pub async fn line_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        Self::line_items_for(&mut conn, order_id).await
    }

    /// Counts total orders (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Orders (connection-level)
    // =========================================================================

    /// Reads one order on the given connection.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>("SELECT id, date_time FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(order)
    }

    /// Inserts a new, empty order stamped with the current time.
    pub async fn insert(conn: &mut SqliteConnection) -> DbResult<Order> {
        let order = Order {
            id: Uuid::new_v4().to_string(),
            date_time: Utc::now(),
        };

        debug!(id = %order.id, "Inserting order");

        sqlx::query("INSERT INTO orders (id, date_time) VALUES (?1, ?2)")
            .bind(&order.id)
            .bind(order.date_time)
            .execute(&mut *conn)
            .await?;

        Ok(order)
    }

    /// Refreshes an order's `date_time` to now.
    ///
    /// Returns `None` if the order does not exist.
    pub async fn touch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let now = Utc::now();

        let result = sqlx::query("UPDATE orders SET date_time = ?2 WHERE id = ?1")
            .bind(id)
            .bind(now)
            .execute(&mut *conn)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        Ok(Some(Order {
            id: id.to_string(),
            date_time: now,
        }))
    }

    /// Deletes an order row. Returns `false` if it did not exist.
    ///
    /// Remaining detail rows go with it (ON DELETE CASCADE) without touching
    /// stock; release them first.
    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Detail lines (connection-level)
    // =========================================================================

    /// Inserts a detail line.
    pub async fn insert_detail(
        conn: &mut SqliteConnection,
        order_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<OrderDetail> {
        let detail = OrderDetail {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            quantity,
        };

        debug!(
            order_id = %order_id,
            product_id = %product_id,
            quantity = quantity,
            "Inserting order detail"
        );

        sqlx::query(
            r#"
            INSERT INTO order_details (id, order_id, product_id, quantity)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&detail.id)
        .bind(&detail.order_id)
        .bind(&detail.product_id)
        .bind(detail.quantity)
        .execute(&mut *conn)
        .await?;

        Ok(detail)
    }

    /// Finds the line an order holds for a product, if any.
    pub async fn find_detail(
        conn: &mut SqliteConnection,
        order_id: &str,
        product_id: &str,
    ) -> DbResult<Option<OrderDetail>> {
        let detail = sqlx::query_as::<_, OrderDetail>(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_details
            WHERE order_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(order_id)
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(detail)
    }

    /// Overwrites the quantity of a detail line.
    pub async fn set_detail_quantity(
        conn: &mut SqliteConnection,
        detail_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(id = %detail_id, quantity = quantity, "Updating order detail quantity");

        sqlx::query("UPDATE order_details SET quantity = ?2 WHERE id = ?1")
            .bind(detail_id)
            .bind(quantity)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Deletes one detail line.
    pub async fn delete_detail(conn: &mut SqliteConnection, detail_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM order_details WHERE id = ?1")
            .bind(detail_id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// All detail lines of an order, in insertion order.
    pub async fn details_for(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<OrderDetail>> {
        let details = sqlx::query_as::<_, OrderDetail>(
            r#"
            SELECT id, order_id, product_id, quantity
            FROM order_details
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(details)
    }

    /// Detail lines of an order joined with product name and price.
    pub async fn line_items_for(
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query_as::<_, LineItem>(
            r#"
            SELECT
                d.id,
                d.order_id,
                d.product_id,
                d.quantity,
                p.name AS product_name,
                p.price_cents AS unit_price_cents,
                p.currency
            FROM order_details d
            INNER JOIN products p ON p.id = d.product_id
            WHERE d.order_id = ?1
            ORDER BY d.rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
