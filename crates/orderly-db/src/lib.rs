//! # orderly-db: Database Layer for Orderly
//!
//! SQLite storage for products and orders, and the transaction boundary for
//! every order mutation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Orderly Data Flow                                │
//! │                                                                         │
//! │  Request handler (register / update / delete order)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   orderly-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   OrderCoordinator  ── BEGIN / COMMIT / ROLLBACK                │   │
//! │  │        │                                                        │   │
//! │  │        ▼                                                        │   │
//! │  │   OrderAggregate    ── one order and its lines                  │   │
//! │  │        │                                                        │   │
//! │  │        ▼                                                        │   │
//! │  │   InventoryLedger   ── reserve / release product stock          │   │
//! │  │        │                                                        │   │
//! │  │        ▼                                                        │   │
//! │  │   Repositories      ── all SQL (product.rs, order.rs)           │   │
//! │  │                                                                 │   │
//! │  │   Database (pool.rs) + Migrations (embedded)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (orderly.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Product and order repositories
//! - [`ledger`] - Stock reservations and releases
//! - [`aggregate`] - An order and its lines
//! - [`coordinator`] - All-or-nothing register, update and delete
//!
//! ## Usage
//!
//! ```rust,ignore
//! use orderly_core::{LineItemRequest, NewProduct};
//! use orderly_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let yerba = db.products().insert(&NewProduct::new("Yerba 1kg", 4_550, 10)).await?;
//! let order = db
//!     .coordinator()
//!     .register(&[LineItemRequest::new(&yerba.id, 2)])
//!     .await?;
//!
//! let total = db.coordinator().total_cost(&order.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod coordinator;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use aggregate::OrderAggregate;
pub use coordinator::OrderCoordinator;
pub use error::{ConfigError, DbError, DbResult, ErrorBody};
pub use ledger::InventoryLedger;
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
