//! # Seed Data Generator
//!
//! Populates the database with a demo hardware-store catalog.
//!
//! ## Usage
//! ```bash
//! # Seed ./ferrepos_dev.db
//! cargo run -p ferre-db --bin seed
//!
//! # Specify database path
//! cargo run -p ferre-db --bin seed -- --db ./data/ferrepos.db
//! ```
//!
//! ## Generated Data
//! - Users: `admin` (administrator) and `cajero` (cashier)
//! - Categories and suppliers
//! - Products in every category with prices, costs and stock levels; a few
//!   start at or below their threshold so the low-stock alert has content

use chrono::Utc;
use ferre_core::{Money, Product, DEFAULT_LOW_STOCK_THRESHOLD};
use ferre_db::repository::generate_id;
use ferre_db::{Database, DbConfig};
use std::collections::HashMap;
use std::env;

const CATEGORIES: &[&str] = &["Tools", "Fasteners", "Plumbing", "Electrical", "Paint"];

const SUPPLIERS: &[&str] = &["Acme Hardware", "Stanley Supply", "Pinturas del Sur"];

/// (sku, name, category, supplier, price, cost, stock)
const PRODUCTS: &[(&str, &str, &str, &str, &str, &str, i64)] = &[
    ("A1", "Claw Hammer 16oz", "Tools", "Stanley Supply", "10.00", "6.20", 5),
    ("TL-SCR-PH2", "Phillips Screwdriver #2", "Tools", "Stanley Supply", "4.50", "2.10", 40),
    ("TL-SAW-20", "Hand Saw 20in", "Tools", "Stanley Supply", "18.90", "11.00", 12),
    ("TL-TAPE-5M", "Tape Measure 5m", "Tools", "Acme Hardware", "7.25", "3.80", 3),
    ("FS-NAIL-2", "Common Nails 2in (1kg)", "Fasteners", "Acme Hardware", "3.40", "1.90", 80),
    ("FS-SCRW-W8", "Wood Screws #8 (100)", "Fasteners", "Acme Hardware", "5.60", "2.70", 55),
    ("FS-ANCH-6", "Wall Anchors 6mm (50)", "Fasteners", "Acme Hardware", "2.95", "1.20", 4),
    ("PL-TEFLON", "PTFE Tape 12mm", "Plumbing", "Acme Hardware", "0.99", "0.35", 120),
    ("PL-PVC-12", "PVC Elbow 1/2in", "Plumbing", "Acme Hardware", "0.75", "0.30", 200),
    ("PL-VALVE-34", "Ball Valve 3/4in", "Plumbing", "Acme Hardware", "9.80", "5.50", 9),
    ("EL-CABLE-25", "Copper Cable 2.5mm (10m)", "Electrical", "Acme Hardware", "14.30", "9.10", 25),
    ("EL-SWITCH", "Single Light Switch", "Electrical", "Acme Hardware", "3.20", "1.40", 2),
    ("EL-LED-9W", "LED Bulb 9W", "Electrical", "Acme Hardware", "2.60", "1.10", 150),
    ("PT-LATEX-4L", "Latex Paint White 4L", "Paint", "Pinturas del Sur", "24.99", "15.00", 18),
    ("PT-BRUSH-2", "Paint Brush 2in", "Paint", "Pinturas del Sur", "3.10", "1.30", 35),
    ("PT-ROLLER", "Paint Roller 9in", "Paint", "Pinturas del Sur", "6.75", "3.40", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = "./ferrepos_dev.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("FerrePOS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./ferrepos_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 FerrePOS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating users...");
    for (username, is_admin) in [("admin", true), ("cajero", false)] {
        if db.users().get_by_username(username).await?.is_none() {
            db.users().create(username, is_admin).await?;
            println!("  {} ({})", username, if is_admin { "admin" } else { "cashier" });
        }
    }

    println!("Creating categories and suppliers...");
    let mut categories = HashMap::new();
    for name in CATEGORIES {
        let category = db.catalog().create_category(name).await?;
        categories.insert(*name, category.id);
    }
    let mut suppliers = HashMap::new();
    for name in SUPPLIERS {
        let supplier = db.catalog().create_supplier(name).await?;
        suppliers.insert(*name, supplier.id);
    }

    println!("Creating products...");
    let mut generated = 0;
    for (sku, name, category, supplier, price, cost, stock) in PRODUCTS {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            sku: sku.to_string(),
            name: name.to_string(),
            price_cents: Money::parse_decimal(price)?.cents(),
            cost_cents: Some(Money::parse_decimal(cost)?.cents()),
            stock: *stock,
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            category_id: categories.get(category).cloned(),
            supplier_id: suppliers.get(supplier).cloned(),
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        generated += 1;
    }

    println!();
    println!("✓ Generated {} products", generated);

    let low = db.products().low_stock(50).await?;
    println!("  Low stock alert: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
