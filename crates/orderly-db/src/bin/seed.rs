//! # Seed Data Generator
//!
//! Populates the database with demo products and places one demo order.
//!
//! ## Usage
//! ```bash
//! # Generate 50 products (default) into ORDERLY_DB_PATH or ./orderly.db
//! cargo run -p orderly-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p orderly-db --bin seed -- --count 200
//!
//! # Specify database path
//! cargo run -p orderly-db --bin seed -- --db ./data/orderly.db
//! ```
//!
//! ## Generated Products
//! `{name} {size}` across a few grocery categories, priced in ARS, with
//! stock between 0 and 60.

use std::env;

use orderly_core::{LineItemRequest, NewProduct};
use orderly_db::{Database, DbConfig};
use tracing_subscriber::EnvFilter;

/// Product names for demo data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Almacen",
        &[
            "Yerba Mate",
            "Azucar",
            "Harina 000",
            "Arroz Largo Fino",
            "Fideos Spaghetti",
            "Aceite de Girasol",
            "Pure de Tomate",
            "Lentejas",
        ],
    ),
    (
        "Bebidas",
        &[
            "Agua Mineral",
            "Soda",
            "Jugo de Naranja",
            "Cerveza Rubia",
            "Vino Malbec",
            "Gaseosa Cola",
        ],
    ),
    (
        "Lacteos",
        &[
            "Leche Entera",
            "Dulce de Leche",
            "Queso Cremoso",
            "Manteca",
            "Yogur Bebible",
        ],
    ),
    (
        "Panaderia",
        &["Pan Frances", "Medialunas", "Facturas Surtidas", "Alfajor de Maicena"],
    ),
];

/// (size label, price addon in cents)
const SIZES: &[(&str, i64)] = &[("Chico", 0), ("Mediano", 45_000), ("Grande", 90_000)];

const DEFAULT_COUNT: usize = 50;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_COUNT;
    let mut db_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(DEFAULT_COUNT);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Orderly Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 50)");
                println!("  -d, --db <PATH>    Database file path (default: $ORDERLY_DB_PATH or ./orderly.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let mut config = DbConfig::from_env()?;
    if let Some(path) = db_path {
        config.database_path = path.into();
    }

    println!("🌱 Orderly Seed Data Generator");
    println!("==============================");
    println!("Database: {}", config.database_path.display());
    println!("Products: {}", count);
    println!();

    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping product generation.");
    } else {
        println!();
        println!("Generating products...");

        let start = std::time::Instant::now();
        let mut generated = 0;

        for (seed, product) in demo_products().take(count).enumerate() {
            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }

            generated += 1;
            if generated % 25 == 0 {
                println!("  Generated {} products...", generated);
            }

            tracing::trace!(seed, name = %product.name, "Inserted demo product");
        }

        println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    }

    // Demo order: one unit of the first few products that have stock
    let items: Vec<LineItemRequest> = db
        .products()
        .list(20)
        .await?
        .into_iter()
        .filter(|product| product.stock > 0)
        .take(3)
        .map(|product| LineItemRequest::new(product.id, 1))
        .collect();

    println!();
    println!("Registering demo order with {} lines...", items.len());

    let coordinator = db.coordinator();
    let order = coordinator.register(&items).await?;

    for line in coordinator.list_line_items(&order.id).await? {
        println!(
            "  {} x {} @ {} {}",
            line.quantity,
            line.product_name,
            line.unit_price(),
            line.currency
        );
    }

    let total = coordinator.total_cost(&order.id).await?;
    println!("✓ Order {} total: {}", order.id, total);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}

/// Logs to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,orderly_db=debug,orderly_core=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Yields every name × size combination with deterministic price and stock.
fn demo_products() -> impl Iterator<Item = NewProduct> {
    CATEGORIES
        .iter()
        .flat_map(|(_, names)| names.iter())
        .flat_map(|name| SIZES.iter().map(move |size| (*name, *size)))
        .enumerate()
        .map(|(seed, (name, (size, price_addon)))| {
            // base $300.00 - $2,299.00 + size addon
            let base_price = 30_000 + ((seed * 1_700) % 200_000) as i64;
            let stock = (seed * 7 % 61) as i64;

            NewProduct::new(format!("{} {}", name, size), base_price + price_addon, stock)
        })
}
