//! # Seed Data Generator
//!
//! Populates a canteen database with a small menu and a handful of
//! customer accounts for development.
//!
//! ## Usage
//! ```bash
//! # Seed ./canteen.db (or $CANTEEN_DB_PATH)
//! cargo run -p canteen-db --bin seed
//!
//! # Specify database path
//! cargo run -p canteen-db --bin seed -- --db ./data/canteen.db
//! ```
//!
//! Balances are written as the opening balance. Nothing here goes through
//! the ledger, so only seed an empty database.

use chrono::Utc;
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use canteen_core::{Customer, CustomerCategory, Product, DEFAULT_REORDER_THRESHOLD};
use canteen_db::{generate_id, Database, DbConfig};

/// (name, price in cents, opening stock)
const MENU: &[(&str, i64, i64)] = &[
    ("Soda", 500, 48),
    ("Sparkling Water", 350, 48),
    ("Orange Juice", 450, 24),
    ("Iced Tea", 400, 24),
    ("Coffee", 250, 200),
    ("Hot Chocolate", 300, 100),
    ("Chips", 300, 60),
    ("Pretzels", 275, 40),
    ("Chocolate Bar", 325, 50),
    ("Gummy Bears", 200, 30),
    ("Granola Bar", 225, 40),
    ("Apple", 150, 30),
    ("Banana", 125, 30),
    ("Ham Sandwich", 650, 12),
    ("Cheese Sandwich", 600, 12),
    ("Instant Noodles", 350, 36),
    ("Yogurt", 275, 18),
    ("Cookies", 250, 8),
];

/// (name, handle, room, category, opening balance in cents)
const CUSTOMERS: &[(&str, &str, Option<&str>, CustomerCategory, i64)] = &[
    ("Alice Martin", "alice", Some("A-101"), CustomerCategory::Standard, 5_000),
    ("Bruno Costa", "bruno", Some("A-102"), CustomerCategory::Standard, 2_500),
    ("Chloe Nguyen", "chloe", Some("B-201"), CustomerCategory::Standard, 0),
    ("Daniel Okafor", "daniel", Some("B-204"), CustomerCategory::Standard, 12_000),
    ("Eva Lindqvist", "eva", None, CustomerCategory::Staff, 0),
    ("Farid Haddad", "farid", None, CustomerCategory::Staff, -1_250),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,canteen=debug,sqlx=warn")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let config = match parse_args(&args, DbConfig::from_env()) {
        Ok(Cli::Seed(config)) => config,
        Ok(Cli::Help) => {
            print_help();
            return Ok(());
        }
        Err(msg) => {
            error!(%msg, "Bad arguments");
            return Err(msg.into());
        }
    };

    info!(path = %config.path.display(), "Seeding database");
    let db = Database::new(config).await?;

    let existing = db.products().count().await? + db.customers().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has data, skipping seed");
        return Ok(());
    }

    let now = Utc::now();

    for (name, price_cents, stock) in MENU {
        db.products()
            .insert(&Product {
                id: generate_id(),
                name: name.to_string(),
                unit_price_cents: *price_cents,
                stock: *stock,
                reorder_threshold: DEFAULT_REORDER_THRESHOLD,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!(count = MENU.len(), "Inserted products");

    for (name, handle, room, category, balance_cents) in CUSTOMERS {
        db.customers()
            .insert(&Customer {
                id: generate_id(),
                name: name.to_string(),
                handle: handle.to_string(),
                room: room.map(str::to_string),
                category: *category,
                balance_cents: *balance_cents,
                initial_balance_cents: *balance_cents,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }
    info!(count = CUSTOMERS.len(), "Inserted customers");

    let low = db.reports().low_stock_products(None).await?;
    info!(low_stock = low.len(), "Seed complete");

    db.close().await;
    Ok(())
}

enum Cli {
    Seed(DbConfig),
    Help,
}

fn parse_args(args: &[String], mut config: DbConfig) -> Result<Cli, String> {
    let mut rest = args.iter().skip(1);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--db" | "-d" => match rest.next() {
                Some(path) => config = DbConfig::new(path),
                None => return Err(format!("{arg} needs a database path")),
            },
            "--help" | "-h" => return Ok(Cli::Help),
            other => warn!(arg = %other, "Ignoring unknown argument"),
        }
    }
    Ok(Cli::Seed(config))
}

fn print_help() {
    println!("Canteen POS Seed Data Generator");
    println!();
    println!("Usage: seed [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -d, --db <PATH>    Database file path (default: $CANTEEN_DB_PATH or ./canteen.db)");
    println!("  -h, --help         Show this help message");
}
