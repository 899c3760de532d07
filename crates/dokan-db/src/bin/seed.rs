//! # Seed Data Generator
//!
//! Populates a database with a small grocery catalog, a store profile and a
//! month of sales, for development and demos.
//!
//! ## Usage
//! ```bash
//! # Seed ./dokan.db (or DOKAN_DB_PATH)
//! cargo run -p dokan-db --bin seed
//!
//! # Specify database path
//! cargo run -p dokan-db --bin seed -- --db ./data/dokan.db
//!
//! # More log output
//! RUST_LOG=debug cargo run -p dokan-db --bin seed
//! ```
//!
//! ## Generated Data
//! - 12 products across rice, oil, spices and snacks, some already low
//! - 30 days of retail and wholesale sales, a third of them on credit
//! - Installments against part of the credit sales
//! - A low-stock summary and a sales report for the period, logged at the end

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use dokan_core::ledger::{SaleLine, SaleRequest};
use dokan_core::report::report_total;
use dokan_core::{
    Customer, Ledger, Money, PaymentMethod, PaymentRequest, Product, SaleSystem, StoreSettings,
    TaxRate, TaxType, Unit,
};
use dokan_db::config::DokanConfig;
use dokan_db::repository::product::generate_product_id;
use dokan_db::{Database, ProductRepository};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// (code, name, category, brand, unit, purchase, retail, wholesale, stock, alert, tax bps)
type CatalogEntry = (&'static str, &'static str, &'static str, &'static str, Unit, i64, i64, i64, i64, i64, u32);

const CATALOG: &[CatalogEntry] = &[
    ("1001", "Miniket Rice 5kg", "rice", "ACI", Unit::Weight, 340, 380, 360, 60, 10, 0),
    ("1002", "Nazirshail Rice 5kg", "rice", "Pran", Unit::Weight, 420, 470, 450, 40, 10, 0),
    ("1003", "Chinigura Rice 1kg", "rice", "Pran", Unit::Weight, 130, 150, 140, 8, 10, 0),
    ("2001", "Soybean Oil 1L", "oil", "Teer", Unit::Volume, 165, 185, 175, 80, 15, 500),
    ("2002", "Soybean Oil 5L", "oil", "Rupchanda", Unit::Volume, 800, 880, 850, 25, 5, 500),
    ("2003", "Mustard Oil 500ml", "oil", "Radhuni", Unit::Volume, 140, 160, 150, 4, 6, 500),
    ("3001", "Turmeric Powder 200g", "spices", "Radhuni", Unit::Piece, 75, 95, 85, 50, 10, 750),
    ("3002", "Chili Powder 200g", "spices", "Radhuni", Unit::Piece, 80, 100, 90, 45, 10, 750),
    ("3003", "Molla Salt 1kg", "spices", "Molla", Unit::Piece, 32, 42, 38, 120, 20, 0),
    ("4001", "Potato Crackers", "snacks", "Pran", Unit::Piece, 15, 20, 18, 200, 30, 1000),
    ("4002", "Dry Cake", "snacks", "Olympic", Unit::Piece, 40, 55, 50, 3, 5, 1000),
    ("4003", "Energy Plus Biscuit", "snacks", "Olympic", Unit::Piece, 25, 35, 30, 150, 25, 1000),
];

const CUSTOMERS: &[(&str, &str)] = &[
    ("Walk-in", ""),
    ("Rahim Uddin", "01711000001"),
    ("Karima Begum", "01811000002"),
    ("Selim Store", "01911000003"),
    ("Nasrin Akter", "01611000004"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dokan=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = DokanConfig::from_env()?;

    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    config.db_path = PathBuf::from(&args[i + 1]);
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dokan Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: DOKAN_DB_PATH or ./dokan.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %config.db_path.display(), "Seeding database");
    let db = Database::new(config.db_config()).await?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products; skipping seed");
        return Ok(());
    }

    seed_catalog(&db.products()).await?;

    let settings = StoreSettings {
        store_name: "Rahman Traders".to_string(),
        phone: "+880 1711-000000".to_string(),
        address: "12 Station Road".to_string(),
        city: "Dhaka".to_string(),
        state: "Dhaka".to_string(),
        zip: "1207".to_string(),
        email: "rahman.traders@example.com".to_string(),
        tax_rate: TaxRate::from_bps(750),
        currency: "BDT".to_string(),
        logo_url: None,
    };
    db.settings().save(&settings).await?;
    info!(
        store = %settings.store_name,
        tax_percent = settings.tax_rate.percentage(),
        "Store settings saved"
    );

    let ledger = Ledger::new(db.products(), db.invoices());
    let end = Utc::now().date_naive();
    let start = end - Duration::days(29);

    let mut sales = 0usize;
    let mut credit = Vec::new();
    for day in 0..30i64 {
        let date = start + Duration::days(day);
        for slot in 0..3i64 {
            let seed = day * 3 + slot;
            let request = sale_request(seed);
            let Some(created_at) = date
                .and_hms_opt(9 + (slot as u32) * 3, 15, 0)
                .map(|naive| Utc.from_utc_datetime(&naive))
            else {
                continue;
            };

            match ledger.record_sale_at(request, created_at).await {
                Ok(invoice) => {
                    sales += 1;
                    if !invoice.is_paid() {
                        credit.push((invoice.id().to_string(), date));
                    }
                }
                Err(err) => warn!(%err, seed, "Sale skipped"),
            }
        }
    }
    info!(sales, credit = credit.len(), "Sales recorded");

    // Collect on every other credit sale a week later, absorbing any overpayment.
    for (n, (id, sold_on)) in credit.iter().enumerate().filter(|(n, _)| n % 2 == 0) {
        let paid_on = (*sold_on + Duration::days(7)).min(end);
        let amount = Money::from_taka(if n % 4 == 0 { 2_000 } else { 300 });
        let request = PaymentRequest::new(paid_on, amount).next_due_on(paid_on + Duration::days(14));
        if let Err(err) = ledger.apply_payment(id, request).await {
            warn!(%err, id = %id, "Payment skipped");
        }
    }

    let low = ledger.low_stock_summary().await?;
    for product in &low.items {
        info!(code = %product.code, name = %product.name, quantity = product.quantity, alert = product.alert_quantity, "Low stock");
    }
    info!(count = low.count, "Low stock summary");

    let report = ledger.report(start, end, db.settings().get().await?).await?;
    for row in &report.rows {
        info!(
            product = %row.product_name,
            sale_system = %row.sale_system,
            quantity = row.total_quantity,
            amount = %config.format_currency(row.total_amount),
            "Report row"
        );
    }
    info!(
        from = %report.from,
        to = %report.to,
        rows = report.rows.len(),
        total = %config.format_currency(report_total(&report.rows)),
        "Seed complete"
    );

    db.close().await;
    Ok(())
}

async fn seed_catalog(products: &ProductRepository) -> Result<(), Box<dyn std::error::Error>> {
    let now = Utc::now();
    for &(code, name, category, brand, unit, purchase, retail, wholesale, quantity, alert, tax) in CATALOG {
        let product = Product {
            id: generate_product_id(),
            code: code.to_string(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            brand: brand.to_string(),
            unit,
            purchase_price: Money::from_taka(purchase),
            retail_price: Money::from_taka(retail),
            wholesale_price: Money::from_taka(wholesale),
            quantity,
            alert_quantity: alert,
            tax_rate: TaxRate::from_bps(tax),
            tax_type: if tax == 0 { TaxType::Exclusive } else { TaxType::Inclusive },
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        products.insert(&product).await?;
    }
    info!(count = CATALOG.len(), "Catalog seeded");
    Ok(())
}

/// A deterministic sale for slot `seed`: one to three lines, wholesale for
/// the shop customer, a third of the sales left partly on credit.
fn sale_request(seed: i64) -> SaleRequest {
    let index = |n: i64, len: usize| (n.unsigned_abs() as usize) % len;
    let (name, phone) = CUSTOMERS[index(seed, CUSTOMERS.len())];
    let sale_system = if name == "Selim Store" {
        SaleSystem::Wholesale
    } else {
        SaleSystem::Retail
    };

    let line_count = 1 + index(seed, 3);
    let lines = (0..line_count)
        .map(|n| {
            let (code, ..) = CATALOG[index(seed * 7 + n as i64 * 5, CATALOG.len())];
            SaleLine::new(code, 1 + (seed + n as i64) % 3)
        })
        .collect();

    let on_credit = seed % 3 == 0;
    SaleRequest {
        customer: Customer::new(name, phone),
        payment_method: match seed % 4 {
            0 => PaymentMethod::Cash,
            1 => PaymentMethod::MobileBanking,
            2 => PaymentMethod::Card,
            _ => PaymentMethod::Cash,
        },
        sale_system,
        lines,
        discount: Money::from_taka(if seed % 5 == 0 { 10 } else { 0 }),
        // Cash sales tender a round ৳5,000 and get change; credit sales leave ৳100 down.
        initial_paid: Money::from_taka(if on_credit { 100 } else { 5_000 }),
        due_date: on_credit.then(|| due_in_a_month(seed)),
    }
}

fn due_in_a_month(seed: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(30 + seed % 7)
}
