//! # Seed Data Generator
//!
//! Populates a development database with a small supermarket: categories,
//! suppliers, staff (including the `system` account the expiry batch runs
//! as), products with expiry dates around today, and two discounts.
//!
//! ## Usage
//! ```bash
//! cargo run -p duka-db --bin seed
//!
//! # Specify database path
//! cargo run -p duka-db --bin seed -- --db ./data/duka.db
//! ```
//!
//! ## Generated Products
//! - Beverages, Dairy, Bakery, Grocery, Household
//! - Perishables get expiry dates spread from 3 days ago to 60 days ahead,
//!   so `duka-backoffice writeoff --preview` has something to show
//! - Retail price is cost plus a 25-40% margin

use chrono::{Days, NaiveDate, Utc};
use std::env;

use duka_core::{
    Category, Customer, Discount, DiscountType, Product, Staff, StaffRole, Supplier,
    DEFAULT_REORDER_LEVEL, DEFAULT_SYSTEM_STAFF,
};
use duka_db::{Database, DbConfig};

/// (category, supplier index, [(name, unit, unit cost in cents, perishable)])
const CATALOG: &[(&str, usize, &[(&str, &str, i64, bool)])] = &[
    (
        "Beverages",
        0,
        &[
            ("Coca-Cola 500ml", "btl", 4_500, false),
            ("Keringet Water 1L", "btl", 5_000, false),
            ("Minute Maid Mango 1L", "btl", 17_000, true),
            ("Kericho Gold Tea 100s", "pack", 22_000, false),
        ],
    ),
    (
        "Dairy",
        1,
        &[
            ("Brookside Whole Milk 500ml", "pkt", 5_500, true),
            ("Brookside Whole Milk 1L", "pkt", 10_500, true),
            ("Daima Yoghurt Strawberry 500ml", "cup", 9_000, true),
            ("Blue Band 500g", "tub", 21_000, false),
        ],
    ),
    (
        "Bakery",
        2,
        &[
            ("Festive White Bread 400g", "loaf", 5_200, true),
            ("Festive Brown Bread 600g", "loaf", 7_400, true),
            ("Supa Loaf 800g", "loaf", 9_800, true),
        ],
    ),
    (
        "Grocery",
        0,
        &[
            ("Jogoo Maize Flour 2kg", "pkt", 16_000, false),
            ("Mumias Sugar 2kg", "pkt", 28_000, false),
            ("Pishori Rice 1kg", "pkt", 19_500, false),
            ("Elianto Corn Oil 1L", "btl", 35_000, false),
        ],
    ),
    (
        "Household",
        2,
        &[
            ("Omo Washing Powder 1kg", "pkt", 32_000, false),
            ("Sunlight Bar Soap 800g", "bar", 18_000, false),
            ("Toilex Tissue 10s", "pack", 39_000, false),
        ],
    ),
];

const SUPPLIERS: &[(&str, &str)] = &[
    ("Bidco Distributors", "orders@bidco.example"),
    ("Brookside Dairy", "sales@brookside.example"),
    ("Mini Bakeries", "supply@minibakeries.example"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./duka_dev.db");

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
                println!("Duka POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./duka_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Duka POS Seed Data Generator");
    println!("============================");
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

    let today = Utc::now().date_naive();

    // Staff
    for (username, first_name, last_name, role) in [
        (DEFAULT_SYSTEM_STAFF, "System", "Account", StaffRole::Admin),
        ("amina", "Amina", "Otieno", StaffRole::Manager),
        ("wanjiku", "Wanjiku", "Kamau", StaffRole::Cashier),
    ] {
        db.staff()
            .insert(&Staff {
                id: String::new(),
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                role,
                phone: None,
                username: username.to_string(),
                // Login is handled elsewhere; seeded accounts cannot sign in.
                password_hash: "!".to_string(),
            })
            .await?;
    }
    println!("✓ Staff created (system, amina, wanjiku)");

    db.customers()
        .insert(&Customer {
            id: String::new(),
            first_name: Some("Baraka".to_string()),
            last_name: Some("Mwangi".to_string()),
            phone: Some("0712000000".to_string()),
            email: None,
        })
        .await?;

    // Suppliers
    let mut supplier_ids = Vec::with_capacity(SUPPLIERS.len());
    for (name, email) in SUPPLIERS {
        let supplier = db
            .suppliers()
            .insert(&Supplier {
                id: String::new(),
                name: name.to_string(),
                contact_number: None,
                email: Some(email.to_string()),
                address: Some("Industrial Area, Nairobi".to_string()),
            })
            .await?;
        supplier_ids.push(supplier.id);
    }
    println!("✓ {} suppliers created", supplier_ids.len());

    // Categories and products
    let mut generated = 0usize;
    let mut expired = 0usize;
    for (category_name, supplier_idx, products) in CATALOG {
        let category = db
            .categories()
            .insert(&Category {
                id: String::new(),
                name: category_name.to_string(),
                description: None,
            })
            .await?;

        for (name, unit, cost_cents, perishable) in products.iter() {
            let expiry_date = perishable.then(|| expiry_for(today, generated));
            if expiry_date.is_some_and(|d| d < today) {
                expired += 1;
            }

            let product = Product {
                id: String::new(),
                name: name.to_string(),
                brand: name.split_whitespace().next().map(str::to_string),
                unit: unit.to_string(),
                unit_cost_cents: *cost_cents,
                retail_price_cents: cost_cents * (125 + (generated as i64 % 4) * 5) / 100,
                stock_quantity: 5 + (generated as i64 * 7) % 60,
                expiry_date,
                reorder_level: DEFAULT_REORDER_LEVEL,
                batch_number: Some(format!("B{}-{:03}", today.format("%y%m"), generated)),
                category_id: category.id.clone(),
                supplier_id: supplier_ids[*supplier_idx].clone(),
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
            generated += 1;
        }
    }
    println!("✓ {} products created ({} already expired)", generated, expired);

    // Discounts valid for the next month
    let month_end = today.checked_add_days(Days::new(30)).unwrap_or(today);
    for (name, discount_type, value) in [
        ("Shop & Save 5%", DiscountType::Percentage, 500),
        ("KSh 200 off", DiscountType::Fixed, 20_000),
    ] {
        db.discounts()
            .insert(&Discount {
                id: String::new(),
                name: name.to_string(),
                discount_type,
                value_hundredths: value,
                start_date: today,
                end_date: month_end,
                is_active: true,
            })
            .await?;
    }
    println!("✓ 2 discounts active until {}", month_end);

    println!();
    let low = db.products().low_stock().await?;
    println!("  Low stock: {} products", low.len());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Spreads expiry dates from 3 days ago to 60 days ahead.
fn expiry_for(today: NaiveDate, seed: usize) -> NaiveDate {
    let offset = (seed * 11) % 64;
    if offset < 3 {
        today.checked_sub_days(Days::new(3 - offset as u64)).unwrap_or(today)
    } else {
        today.checked_add_days(Days::new(offset as u64 - 3)).unwrap_or(today)
    }
}
