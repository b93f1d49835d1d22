//! # Seed Data Generator
//!
//! Populates the database with a demo catalog, customers and credit sales
//! for development.
//!
//! ## Usage
//! ```bash
//! # Default: TILL_DB_PATH (or the platform data dir), 6 customers
//! cargo run -p till-db --bin seed
//!
//! # More customers, each with one credit sale
//! cargo run -p till-db --bin seed -- --customers 20
//!
//! # Specify database path
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//!
//! # Faster penalties while testing overdue handling
//! TILL_PENALTY_RATE=0.1 cargo run -p till-db --bin seed
//! ```
//!
//! ## Generated Data
//! - Products sold by weight, volume, length, piece and box
//! - Customers, each with a credit sale of 2 to 6 installments
//! - Some of those sales started months ago, so refreshing overdue status
//!   produces penalties
//! - A couple of counter sales and an expense in today's cash register

use chrono::{Months, Utc};
use std::env;
use std::path::PathBuf;
use till_core::installment::InstallmentConfig;
use till_core::validation::CustomerSelection;
use till_core::{Money, PaymentMethod, Product, Unit};
use till_db::{CreditLine, Database, NewCreditSale, StoreConfig};
use tracing::{info, warn};
use uuid::Uuid;

/// Demo catalog: sku, name, unit, price, cost, discount, stock.
const CATALOG: &[(&str, &str, Unit, i64, i64, Option<f64>, Option<f64>)] = &[
    ("RICE-KG", "Rice", Unit::Kilogram, 180, 120, None, Some(250.0)),
    ("BEANS-KG", "Black Beans", Unit::Kilogram, 320, 210, None, Some(120.0)),
    ("FLOUR-KG", "Wheat Flour", Unit::Kilogram, 150, 95, Some(5.0), Some(80.0)),
    ("SAFFRON-G", "Saffron", Unit::Gram, 90, 55, None, Some(500.0)),
    ("OIL-L", "Sunflower Oil", Unit::Liter, 410, 300, None, Some(60.0)),
    ("VINEGAR-L", "Vinegar", Unit::Liter, 130, 70, None, Some(40.0)),
    ("PAINT-L", "Wall Paint", Unit::Liter, 900, 650, Some(10.0), Some(75.0)),
    ("ROPE-M", "Nylon Rope", Unit::Meter, 75, 40, None, Some(300.0)),
    ("FAN-40", "Standing Fan", Unit::Unit, 45000, 31000, None, Some(12.0)),
    ("TV-32", "Television 32in", Unit::Unit, 189000, 150000, Some(3.0), Some(5.0)),
    ("FRIDGE-1D", "Refrigerator", Unit::Unit, 320000, 260000, None, Some(3.0)),
    ("SOAP-BOX", "Soap Bars", Unit::Box, 1200, 800, None, None),
    ("EGGS-DZ", "Eggs", Unit::Dozen, 390, 280, None, Some(30.0)),
];

const CUSTOMERS: &[&str] = &[
    "Ana Souza",
    "Bruno Lima",
    "Carla Mendes",
    "Diego Rocha",
    "Elena Costa",
    "Fabio Nunes",
    "Gisela Prado",
    "Hugo Teixeira",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    till_db::init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut config = StoreConfig::from_env();
    let mut customers: usize = 6;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--customers" | "-c" => {
                if i + 1 < args.len() {
                    customers = args[i + 1].parse().unwrap_or(6);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.database_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Till Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --customers <N>  Customers with a credit sale (default: 6)");
                println!("  -d, --db <PATH>      Database file path (default: TILL_DB_PATH or data dir)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(
        db = %config.database_path.display(),
        store = %config.store_name,
        penalty_rate = config.penalty_rate,
        customers,
        "Seeding database"
    );

    let db = Database::new(config.db_config()).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        println!("Delete {} to regenerate.", config.database_path.display());
        return Ok(());
    }

    // Catalog
    let mut products = Vec::with_capacity(CATALOG.len());
    for (sku, name, unit, price, cost, discount, stock) in CATALOG {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            unit: *unit,
            price_cents: *price,
            cost_cents: *cost,
            discount_pct: *discount,
            current_stock: *stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        products.push(db.products().insert(&product).await?);
    }
    info!(count = products.len(), "Catalog created");

    // Credit sales
    let today = Utc::now().date_naive();
    let credit = db.credit_sales().with_penalty_rate(config.penalty_rate);
    let mut created = 0;

    for n in 0..customers {
        let name = match CUSTOMERS.get(n) {
            Some(name) => name.to_string(),
            None => format!("Customer {}", n + 1),
        };

        let appliance = &products[8 + n % 3];
        let grocery = &products[n % 3];
        let count = 2 + (n % 5) as u32;
        let months_ago = (n % 4) as u32;

        let start_date = today
            .checked_sub_months(Months::new(months_ago))
            .unwrap_or(today);

        let request = NewCreditSale {
            customer: Some(CustomerSelection::New(name.clone())),
            lines: vec![
                CreditLine {
                    product_id: appliance.id.clone(),
                    quantity: 1.0,
                    unit: Unit::Unit,
                },
                CreditLine {
                    product_id: grocery.id.clone(),
                    quantity: 500.0 * (n as f64 + 1.0),
                    unit: Unit::Gram,
                },
            ],
            manual_amount: if n % 2 == 0 {
                Money::from_cents(5_000)
            } else {
                Money::zero()
            },
            manual_profit_pct: 20.0,
            config: InstallmentConfig {
                current_installment: 1 + months_ago.min(count - 1) / 2,
                ..InstallmentConfig::new(count, (n % 3) as f64 * 2.5, start_date)
            },
            notes: Some(format!("Seeded sale #{}", n + 1)),
        };

        match credit.create_credit_sale(&request).await {
            Ok(detail) => {
                created += 1;
                info!(
                    customer = %name,
                    total = %Money::from_cents(detail.sale.total_with_interest_cents),
                    installments = detail.installments.len(),
                    "Credit sale created"
                );
            }
            Err(e) => warn!(customer = %name, error = %e, "Failed to create credit sale"),
        }
    }

    let changed = credit.refresh_overdue(today).await?;
    info!(created, overdue_updated = changed, "Credit sales seeded");

    // One payment so the register shows credit income
    if let Some(installment) = credit.open_installments_due_by(today).await?.first() {
        let receipt = credit
            .pay_installment(&installment.id, PaymentMethod::Transfer)
            .await?;
        info!(amount = %Money::from_cents(receipt.movement.amount_cents), "Seed payment recorded");
    }

    // Counter activity
    let register = db.cash_register();
    register
        .record_income(Money::from_cents(12_350), Money::from_cents(3_100), "Counter sale")
        .await?;
    register
        .record_income(Money::from_cents(4_800), Money::from_cents(1_150), "Counter sale")
        .await?;
    register
        .record_expense(Money::from_cents(2_500), "Delivery fuel")
        .await?;

    let summary = register.daily_summary(today).await?;
    println!();
    println!("Seed complete: {}", config.store_name);
    println!("  Products:      {}", products.len());
    println!("  Credit sales:  {}", created);
    println!("  Income today:  {}", config.format_currency(summary.income.cents()));
    println!("  Expense today: {}", config.format_currency(summary.expense.cents()));
    println!("  Balance today: {}", config.format_currency(summary.balance.cents()));

    Ok(())
}
