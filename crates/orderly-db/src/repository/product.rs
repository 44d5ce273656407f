//! # Product Repository
//!
//! Database operations for catalog products.
//!
//! ## Key Operations
//! - CRUD operations on the catalog
//! - Connection-level helpers the ledger runs inside a transaction
//!
//! ## Guarded Stock Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Stock Is Persisted                               │
//! │                                                                         │
//! │  Ledger decides: reserve 3 units of P                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE products SET stock = stock + (-3)                              │
//! │  WHERE id = P AND stock + (-3) >= 0                                    │
//! │       │                                                                 │
//! │       ├── 1 row  → written, the row never went negative                │
//! │       └── 0 rows → someone else took the stock first (or P is gone)    │
//! │                                                                         │
//! │  The delta is applied to the row as it is NOW, not to the value the    │
//! │  caller read earlier, so two writers can never both spend the same     │
//! │  units.                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderly_core::validation::{
    validate_currency, validate_new_product, validate_price_cents, validate_product_name,
    validate_stock,
};
use orderly_core::{NewProduct, Product};

const PRODUCT_COLUMNS: &str = "id, name, price_cents, currency, stock";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.insert(&NewProduct::new("Yerba 1kg", 4_550, 10)).await?;
/// let found = repo.get_by_id(&product.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    // =========================================================================
    // Pool-level operations
    // =========================================================================

    /// Validates and inserts a new product, returning it with its new ID.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new)?;

        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            currency: new.currency.clone(),
            stock: new.stock,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, currency, stock)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(product.stock)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch(&mut conn, id).await
    }

    /// Lists products sorted by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id LIMIT ?1");

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Updates name, price, currency and stock of an existing product.
    ///
    /// Setting stock here is a catalog correction; it bypasses the ledger and
    /// does not touch any order line.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product_name(&product.name)?;
        validate_stock(product.stock)?;
        validate_price_cents(product.price_cents)?;
        validate_currency(&product.currency)?;

        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = ?2, price_cents = ?3, currency = ?4, stock = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(product.name.trim())
        .bind(product.price_cents)
        .bind(&product.currency)
        .bind(product.stock)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product.
    ///
    /// Fails with `ForeignKeyViolation` while any order line still holds
    /// stock of it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Connection-level helpers (run inside the caller's transaction)
    // =========================================================================

    /// Reads one product on the given connection.
    pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(product)
    }

    /// Applies a signed `delta` to a product's stock unless that would make
    /// it negative.
    ///
    /// Returns `false` when nothing was written: either the guard failed or
    /// the product does not exist.
    pub async fn persist_stock(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<bool> {
        debug!(id = %id, delta = delta, "Persisting stock delta");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
