//! # Repository Module
//!
//! Database repository implementations for Orderly.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Where the SQL Lives                                  │
//! │                                                                         │
//! │  OrderCoordinator / InventoryLedger / OrderAggregate                   │
//! │       │                                                                 │
//! │       │  ProductRepository::persist_stock(&mut tx, id, -3)             │
//! │       │  OrderRepository::insert_detail(&mut tx, order, product, 3)    │
//! │       ▼                                                                 │
//! │  ProductRepository              OrderRepository                        │
//! │  ├── insert / update / delete   ├── get_by_id / list / count           │
//! │  ├── get_by_id / list / count   ├── insert / touch / delete            │
//! │  └── fetch / persist_stock      └── *_detail / details_for / line_items│
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Nothing outside this module writes SQL.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD and guarded stock writes
//! - [`OrderRepository`](order::OrderRepository) - Orders and their detail lines

pub mod order;
pub mod product;
