//! # Demo Data Seeder
//!
//! Prepares a database for a walkthrough: seeds the BOM, stocks the shelves,
//! and rings up a batch of sales.
//!
//! ## Usage
//! ```bash
//! # 20 demo sales (default)
//! cargo run -p brewline-db --bin seed
//!
//! # Custom amount
//! cargo run -p brewline-db --bin seed -- --orders 200
//!
//! # Specify database path
//! cargo run -p brewline-db --bin seed -- --db ./data/brewline.db
//! ```
//!
//! Opening stock is set with the built-in admin pair, so the seeder refuses
//! to run against a database whose admin has been changed.

use std::env;

use brewline_core::admin::{AdminCredentials, AdminGate, DEFAULT_ADMIN_ID, DEFAULT_ADMIN_PASSWORD};
use brewline_core::cart::Cart;
use brewline_core::inventory::InventoryEdit;
use brewline_core::CustomerInput;
use brewline_db::{Database, DbConfig};

/// Opening stock: (ingredient, quantity, safety stock).
const OPENING_STOCK: &[(&str, f64, f64)] = &[
    ("Espresso Beans", 5000.0, 500.0),
    ("Milk", 20000.0, 2000.0),
    ("Hot Water", 50000.0, 0.0),
    ("Chocolate Syrup", 1000.0, 150.0),
];

/// Demo regulars: (customer number, name).
const CUSTOMERS: &[(&str, &str)] = &[
    ("0300-1000001", "Ayesha"),
    ("0300-1000002", "Bilal"),
    ("0300-1000003", "Chen"),
    ("0300-1000004", "Dana"),
    ("0300-1000005", "Emeka"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 20;
    let mut db_path = String::from("./brewline_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-n" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Brewline Demo Data Seeder");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -n, --orders <N>   Number of demo sales (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./brewline_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Brewline Demo Data Seeder");
    println!("=========================");
    println!("Database: {}", db_path);
    println!("Sales:    {}", orders);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let cafe = db.cafe(AdminGate::default());
    println!("✓ Connected to database, migrations applied");

    let report = cafe.bootstrap().await?;
    println!(
        "✓ BOM rows inserted: {}, inventory rows created: {}",
        report.bom_entries_inserted, report.inventory_rows_created
    );

    if !cafe.billing_history(1).await?.is_empty() {
        println!("⚠ Database already has sales; skipping to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let admin = AdminCredentials::new(DEFAULT_ADMIN_ID, DEFAULT_ADMIN_PASSWORD);
    let edits = OPENING_STOCK
        .iter()
        .map(|(name, qty, safety)| InventoryEdit::new(*name, *qty, *safety))
        .collect();
    let changes = cafe.update_inventory_levels(&admin, edits).await?;
    println!("✓ Opening stock set ({} change log entries)", changes.len());

    println!();
    println!("Ringing up sales...");
    let start = std::time::Instant::now();
    let menu = cafe.catalog().products();
    let mut revenue = 0;

    for n in 0..orders {
        let mut cart = Cart::new();
        cart.add(&menu[n % menu.len()], 1 + (n % 3) as i64)?;
        if n % 4 == 0 {
            cart.add(&menu[(n + 2) % menu.len()], 1)?;
        }

        let (number, name) = CUSTOMERS[n % CUSTOMERS.len()];
        let receipt = cafe
            .checkout(&cart, &CustomerInput::new(number).with_name(name))
            .await?;
        revenue += receipt.total_cents;

        // Leave the latest few in the kitchen queue.
        if n + 3 < orders {
            cafe.complete_invoice(&receipt.invoice_id).await?;
        }
    }

    println!(
        "✓ {} sales in {:?}, revenue {}",
        orders,
        start.elapsed(),
        brewline_core::Money::from_cents(revenue)
    );

    println!();
    println!("Stock after sales:");
    for row in cafe.stock_report().await? {
        let flag = if row.below_safety_stock { "  LOW" } else { "" };
        println!(
            "  {:<16} {:>10.1} {:<3}{}",
            row.ingredient, row.quantity, row.unit, flag
        );
    }

    println!();
    println!("✓ Seed complete!");
    db.close().await;

    Ok(())
}
