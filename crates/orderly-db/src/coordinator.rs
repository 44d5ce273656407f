//! # Order Transaction Coordinator
//!
//! Runs register, update and delete as all-or-nothing units.
//!
//! ## Call Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  register(items) / update(order_id, items)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  validate_line_items  ── quantity < 0 ──► ValidationError    (no tx)   │
//! │       │               ── same product ──► DuplicateProducts  (no tx)   │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  for item in items (caller order)                                       │
//! │       ├── ok   → next item                                              │
//! │       └── fail → ROLLBACK, return that error (later items never run)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT ──► Committed(Order)                                            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failed call leaves no trace: no order row, no detail row, no stock
//! change, whatever earlier items in the same call had done.
//!
//! ## Concurrency
//! Every step of a call runs on one pooled connection inside
//! `BEGIN IMMEDIATE`, so the write lock is taken before the first read and
//! concurrent calls queue on `busy_timeout` instead of failing on a lock
//! upgrade. The ledger's guarded stock UPDATE still rejects a reservation
//! the row can no longer cover.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};

use crate::aggregate::OrderAggregate;
use crate::error::{DbError, DbResult};
use orderly_core::validation::validate_line_items;
use orderly_core::{CoreError, ExchangeRate, LineItem, LineItemRequest, Money, Order};

/// Entry point for every order mutation.
///
/// ## Usage
/// ```rust,ignore
/// let coordinator = db.coordinator();
///
/// let order = coordinator
///     .register(&[LineItemRequest::new(&yerba.id, 2)])
///     .await?;
///
/// coordinator
///     .update(&order.id, &[LineItemRequest::new(&yerba.id, 5)])
///     .await?;
///
/// coordinator.delete(&order.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OrderCoordinator {
    pool: SqlitePool,
}

impl OrderCoordinator {
    pub fn new(pool: SqlitePool) -> Self {
        OrderCoordinator { pool }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Creates an order holding one line per item.
    ///
    /// An empty list creates an order with no lines.
    #[instrument(name = "coordinator::register", skip(self, items), fields(items = items.len()))]
    pub async fn register(&self, items: &[LineItemRequest]) -> DbResult<Order> {
        validate_line_items(items)?;

        let mut conn = self.begin().await?;
        let result = register_lines(&mut conn, items).await;
        let order = finish(conn, result).await?;

        info!(order_id = %order.id, "Order registered");
        Ok(order)
    }

    /// Moves existing lines of an order to new quantities.
    ///
    /// Only lines the order already has can be changed. On success the
    /// order's `date_time` is refreshed, even for an empty item list.
    #[instrument(
        name = "coordinator::update",
        skip(self, items),
        fields(order_id = %order_id, items = items.len())
    )]
    pub async fn update(&self, order_id: &str, items: &[LineItemRequest]) -> DbResult<Order> {
        validate_line_items(items)?;

        let mut conn = self.begin().await?;
        let result = update_lines(&mut conn, order_id, items).await;
        let order = finish(conn, result).await?;

        info!(order_id = %order.id, "Order updated");
        Ok(order)
    }

    /// Deletes an order, giving every line's stock back first.
    #[instrument(name = "coordinator::delete", skip(self), fields(order_id = %order_id))]
    pub async fn delete(&self, order_id: &str) -> DbResult<()> {
        let mut conn = self.begin().await?;
        let result = delete_order(&mut conn, order_id).await;
        finish(conn, result).await?;

        info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lines of an order with product name and unit price.
    pub async fn list_line_items(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let mut conn = self.pool.acquire().await?;
        let aggregate = OrderAggregate::load(&mut conn, order_id).await?;
        aggregate.line_items(&mut conn).await
    }

    /// Σ quantity × unit price over an order's lines.
    pub async fn total_cost(&self, order_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        let aggregate = OrderAggregate::load(&mut conn, order_id).await?;
        aggregate.total_cost(&mut conn).await
    }

    /// Order total converted with a caller-supplied exchange rate.
    ///
    /// Fetching the rate is up to the caller.
    pub async fn total_in_currency(&self, order_id: &str, rate: ExchangeRate) -> DbResult<Money> {
        let total = self.total_cost(order_id).await?;
        let converted = total.convert(rate).ok_or_else(|| CoreError::Overflow {
            what: "converted total".to_string(),
        })?;
        Ok(converted)
    }

    /// Checks out a connection and takes SQLite's write lock on it.
    async fn begin(&self) -> DbResult<PoolConnection<Sqlite>> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(conn)
    }
}

// =============================================================================
// Transaction bodies
// =============================================================================

async fn register_lines(conn: &mut SqliteConnection, items: &[LineItemRequest]) -> DbResult<Order> {
    let aggregate = OrderAggregate::create(conn).await?;

    for item in items {
        aggregate
            .add_line(conn, &item.product_id, item.quantity)
            .await?;
    }

    Ok(aggregate.into_order())
}

async fn update_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
    items: &[LineItemRequest],
) -> DbResult<Order> {
    let mut aggregate = OrderAggregate::load(conn, order_id).await?;

    for item in items {
        aggregate
            .adjust_line(conn, &item.product_id, item.quantity)
            .await?;
    }

    aggregate.touch(conn).await?;
    Ok(aggregate.into_order())
}

async fn delete_order(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    OrderAggregate::load(conn, order_id).await?.delete(conn).await
}

/// Commits on success; rolls back and hands the original error back
/// otherwise.
async fn finish<T>(mut conn: PoolConnection<Sqlite>, result: DbResult<T>) -> DbResult<T> {
    match result {
        Ok(value) => {
            if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
                // a connection left inside a transaction must not go back to the pool
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                conn.close_on_drop();
                return Err(DbError::TransactionFailed(commit_err.to_string()));
            }
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "Rolling back");
            if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                warn!(error = %rollback_err, "Rollback failed");
                conn.close_on_drop();
            }
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use std::time::Duration;
    use orderly_core::{ErrorCode, NewProduct, Product, ValidationError, MAX_PRICE_CENTS};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
        db.products()
            .insert(&NewProduct::new(name, price_cents, stock))
            .await
            .unwrap()
    }

    async fn stock(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    fn item(product: &Product, quantity: i64) -> LineItemRequest {
        LineItemRequest::new(&product.id, quantity)
    }

    // -------------------------------------------------------------------------
    // register
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_register_reserves_stock_and_creates_lines() {
        let db = test_db().await;
        let a = product(&db, "Yerba", 4_550, 10).await;
        let b = product(&db, "Azucar", 1_100, 3).await;

        let order = db
            .coordinator()
            .register(&[item(&a, 4), item(&b, 3)])
            .await
            .unwrap();

        assert_eq!(stock(&db, &a.id).await, 6);
        assert_eq!(stock(&db, &b.id).await, 0);

        let lines = db.coordinator().list_line_items(&order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].product_id, a.id);
        assert_eq!(lines[0].quantity, 4);
        assert_eq!(lines[1].product_id, b.id);
        assert_eq!(lines[1].quantity, 3);
    }

    #[tokio::test]
    async fn test_register_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 3).await;

        let err = db
            .coordinator()
            .register(&[item(&a, 5), item(&b, 5)])
            .await
            .unwrap_err();

        match err {
            DbError::Domain(CoreError::InsufficientStock {
                product_id,
                available,
            }) => {
                assert_eq!(product_id, b.id);
                assert_eq!(available, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        assert_eq!(stock(&db, &a.id).await, 10);
        assert_eq!(stock(&db, &b.id).await, 3);
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_stops_at_first_failure() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 1).await;
        let b = product(&db, "B", 100, 1).await;

        // both items fail; the first one decides the error
        let err = db
            .coordinator()
            .register(&[item(&a, 2), item(&b, 2)])
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_domain(),
            Some(CoreError::InsufficientStock { product_id, .. }) if *product_id == a.id
        ));
    }

    #[tokio::test]
    async fn test_register_unknown_product_rolls_back() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;

        let err = db
            .coordinator()
            .register(&[item(&a, 2), LineItemRequest::new("missing", 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(stock(&db, &a.id).await, 10);
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_duplicate_products_creates_no_order() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 10).await;

        let err = db
            .coordinator()
            .register(&[item(&a, 1), item(&b, 1), item(&a, 2)])
            .await
            .unwrap_err();

        assert_eq!(
            err.as_domain(),
            Some(&CoreError::DuplicateProducts {
                product_ids: vec![a.id.clone()]
            })
        );
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert_eq!(stock(&db, &a.id).await, 10);
        assert_eq!(stock(&db, &b.id).await, 10);
    }

    #[tokio::test]
    async fn test_register_negative_quantity_is_rejected() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;

        let err = db
            .coordinator()
            .register(&[item(&a, -1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Negative { .. }))
        ));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_register_empty_creates_empty_order() {
        let db = test_db().await;

        let order = db.coordinator().register(&[]).await.unwrap();

        assert_eq!(db.orders().count().await.unwrap(), 1);
        assert!(db
            .coordinator()
            .list_line_items(&order.id)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            db.coordinator().total_cost(&order.id).await.unwrap(),
            Money::zero()
        );
    }

    #[tokio::test]
    async fn test_register_zero_quantity_line() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 0).await;

        let order = db.coordinator().register(&[item(&a, 0)]).await.unwrap();

        let lines = db.coordinator().list_line_items(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 0);
        assert_eq!(stock(&db, &a.id).await, 0);
    }

    // -------------------------------------------------------------------------
    // update
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_update_decrease_releases_stock() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let order = db.coordinator().register(&[item(&a, 5)]).await.unwrap();
        assert_eq!(stock(&db, &a.id).await, 5);

        let updated = db
            .coordinator()
            .update(&order.id, &[item(&a, 2)])
            .await
            .unwrap();

        assert_eq!(updated.id, order.id);
        assert!(updated.date_time >= order.date_time);
        assert_eq!(stock(&db, &a.id).await, 8);
    }

    #[tokio::test]
    async fn test_update_increase_reserves_stock() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let order = db.coordinator().register(&[item(&a, 5)]).await.unwrap();

        db.coordinator()
            .update(&order.id, &[item(&a, 8)])
            .await
            .unwrap();

        assert_eq!(stock(&db, &a.id).await, 2);
        let lines = db.coordinator().list_line_items(&order.id).await.unwrap();
        assert_eq!(lines[0].quantity, 8);
    }

    #[tokio::test]
    async fn test_update_beyond_available_changes_nothing() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 10).await;
        let order = db
            .coordinator()
            .register(&[item(&a, 5), item(&b, 5)])
            .await
            .unwrap();

        let before = db.orders().get_by_id(&order.id).await.unwrap().unwrap();

        // a: stock 5 + held 5 = 10 available, 11 requested
        let err = db
            .coordinator()
            .update(&order.id, &[item(&b, 1), item(&a, 11)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 10, .. })
        ));
        assert_eq!(stock(&db, &a.id).await, 5);
        assert_eq!(stock(&db, &b.id).await, 5);

        let lines = db.coordinator().list_line_items(&order.id).await.unwrap();
        assert!(lines.iter().all(|line| line.quantity == 5));

        let after = db.orders().get_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(after.date_time, before.date_time);
    }

    #[tokio::test]
    async fn test_update_product_not_on_order() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 10).await;
        let order = db.coordinator().register(&[item(&a, 1)]).await.unwrap();

        let err = db
            .coordinator()
            .update(&order.id, &[item(&a, 3), item(&b, 1)])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::LineItemNotFound { .. })
        ));
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(stock(&db, &a.id).await, 9);
        assert_eq!(stock(&db, &b.id).await, 10);
    }

    #[tokio::test]
    async fn test_update_unknown_order() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;

        let err = db
            .coordinator()
            .update("missing", &[item(&a, 1)])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_validates_before_lookup() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;

        let err = db
            .coordinator()
            .update("missing", &[item(&a, 1), item(&a, 1)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::DuplicateProducts { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_empty_only_refreshes_timestamp() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let order = db.coordinator().register(&[item(&a, 4)]).await.unwrap();

        let updated = db.coordinator().update(&order.id, &[]).await.unwrap();

        assert!(updated.date_time >= order.date_time);
        assert_eq!(stock(&db, &a.id).await, 6);
    }

    // -------------------------------------------------------------------------
    // delete
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 3).await;
        let order = db
            .coordinator()
            .register(&[item(&a, 7), item(&b, 3)])
            .await
            .unwrap();

        db.coordinator().delete(&order.id).await.unwrap();

        assert_eq!(stock(&db, &a.id).await, 10);
        assert_eq!(stock(&db, &b.id).await, 3);
        assert_eq!(db.orders().count().await.unwrap(), 0);
        assert!(matches!(
            db.coordinator().list_line_items(&order.id).await,
            Err(DbError::Domain(CoreError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_update_then_delete_round_trip() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 10).await;
        let b = product(&db, "B", 100, 6).await;
        let order = db
            .coordinator()
            .register(&[item(&a, 5), item(&b, 2)])
            .await
            .unwrap();

        db.coordinator()
            .update(&order.id, &[item(&a, 9), item(&b, 1)])
            .await
            .unwrap();
        assert_eq!(stock(&db, &a.id).await, 1);
        assert_eq!(stock(&db, &b.id).await, 5);

        db.coordinator().delete(&order.id).await.unwrap();
        assert_eq!(stock(&db, &a.id).await, 10);
        assert_eq!(stock(&db, &b.id).await, 6);
    }

    #[tokio::test]
    async fn test_delete_unknown_order() {
        let db = test_db().await;
        let err = db.coordinator().delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn test_orders_share_stock() {
        let db = test_db().await;
        let a = product(&db, "A", 100, 5).await;

        let first = db.coordinator().register(&[item(&a, 3)]).await.unwrap();
        let err = db
            .coordinator()
            .register(&[item(&a, 3)])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 2, .. })
        ));

        db.coordinator().delete(&first.id).await.unwrap();
        db.coordinator().register(&[item(&a, 5)]).await.unwrap();
        assert_eq!(stock(&db, &a.id).await, 0);
    }

    // -------------------------------------------------------------------------
    // totals
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_total_cost_and_conversion() {
        let db = test_db().await;
        let a = product(&db, "A", 1_050, 10).await;
        let b = product(&db, "B", 2_000, 10).await;
        let order = db
            .coordinator()
            .register(&[item(&a, 2), item(&b, 3)])
            .await
            .unwrap();

        // 2 × 10.50 + 3 × 20.00 = 81.00
        let total = db.coordinator().total_cost(&order.id).await.unwrap();
        assert_eq!(total, Money::from_cents(8_100));

        let rate = ExchangeRate::parse("1.012,50").unwrap();
        let converted = db
            .coordinator()
            .total_in_currency(&order.id, rate)
            .await
            .unwrap();
        // 81.00 / 1012.50 = 0.08
        assert_eq!(converted, Money::from_cents(8));

        assert!(matches!(
            db.coordinator().total_cost("missing").await,
            Err(DbError::Domain(CoreError::OrderNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_total_too_large_is_an_error() {
        let db = test_db().await;
        let a = product(&db, "Lingote", MAX_PRICE_CENTS, 1_000_000).await;
        let order = db
            .coordinator()
            .register(&[item(&a, 1_000_000)])
            .await
            .unwrap();

        let err = db.coordinator().total_cost(&order.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Overflow { .. })));
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let rate = ExchangeRate::parse("1.000,00").unwrap();
        assert!(matches!(
            db.coordinator().total_in_currency(&order.id, rate).await,
            Err(DbError::Domain(CoreError::Overflow { .. }))
        ));

        // the order itself is untouched and can still be released
        db.coordinator().delete(&order.id).await.unwrap();
        assert_eq!(stock(&db, &a.id).await, 1_000_000);
    }

    // -------------------------------------------------------------------------
    // concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_calls_on_shared_product() {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("orderly.db"))
            .max_connections(8)
            .busy_timeout(Duration::from_secs(30));
        let db = Database::new(config).await.unwrap();
        let a = product(&db, "Yerba", 4_550, 1_000).await;

        let mut order_ids = Vec::new();
        for _ in 0..8 {
            let order = db.coordinator().register(&[item(&a, 1)]).await.unwrap();
            order_ids.push(order.id);
        }

        let mut handles = Vec::new();
        for order_id in order_ids.clone() {
            let coordinator = db.coordinator();
            let product_id = a.id.clone();
            handles.push(tokio::spawn(async move {
                for n in 0..30 {
                    let quantity = 1 + n % 5;
                    coordinator
                        .update(&order_id, &[LineItemRequest::new(&product_id, quantity)])
                        .await?;
                }
                Ok::<_, DbError>(())
            }));
        }
        for _ in 0..4 {
            let coordinator = db.coordinator();
            let product_id = a.id.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    let order = coordinator
                        .register(&[LineItemRequest::new(&product_id, 2)])
                        .await?;
                    coordinator.delete(&order.id).await?;
                }
                Ok::<_, DbError>(())
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut held = 0;
        for order_id in &order_ids {
            let lines = db.coordinator().list_line_items(order_id).await.unwrap();
            held += lines.iter().map(|line| line.quantity).sum::<i64>();
        }
        assert_eq!(db.orders().count().await.unwrap(), 8);
        assert_eq!(stock(&db, &a.id).await + held, 1_000);

        db.close().await;
    }
}
