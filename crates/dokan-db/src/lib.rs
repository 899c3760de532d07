//! # dokan-db: Database Layer for Dokan
//!
//! This crate provides SQLite storage for the Dokan shop ledger, with sqlx
//! for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dokan Data Flow                                  │
//! │                                                                         │
//! │  Ledger::record_sale / apply_payment / report  (dokan-core)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     dokan-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo    │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ InvoiceRepo    │    │   _schema    │  │   │
//! │  │   │               │    │ SettingsRepo   │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (DOKAN_DB_PATH, default ./dokan.db)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment configuration
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dokan_core::Ledger;
//! use dokan_db::{Database, DokanConfig};
//!
//! let config = DokanConfig::from_env()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let ledger = Ledger::new(db.products(), db.invoices());
//! let low = ledger.low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, DokanConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
pub use repository::settings::SettingsRepository;

// =============================================================================
// Ledger over SQLite
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::tests::sample;
    use chrono::{NaiveDate, TimeZone, Utc};
    use dokan_core::ledger::{SaleLine, SaleRequest};
    use dokan_core::listing::{InvoiceQuery, StatusFilter};
    use dokan_core::{
        CoreError, Customer, Ledger, LedgerError, Money, PaymentMethod, PaymentRequest, SaleSystem,
    };

    type SqlLedger = Ledger<ProductRepository, InvoiceRepository>;

    async fn ledger() -> (Database, SqlLedger) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let products = db.products();
        products.insert(&sample("1001", "Miniket Rice 5kg", 10, 3)).await.unwrap();
        products.insert(&sample("1002", "Soybean Oil 1L", 2, 2)).await.unwrap();
        let ledger = Ledger::new(db.products(), db.invoices());
        (db, ledger)
    }

    fn request(customer: &str, lines: Vec<SaleLine>, paid: i64) -> SaleRequest {
        SaleRequest {
            customer: Customer::new(customer, "01711000000"),
            payment_method: PaymentMethod::Cash,
            sale_system: SaleSystem::Retail,
            lines,
            discount: Money::zero(),
            initial_paid: Money::from_taka(paid),
            due_date: None,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[tokio::test]
    async fn test_sale_moves_stock_and_persists() {
        let (db, ledger) = ledger().await;
        let created_at = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();

        let invoice = ledger
            .record_sale_at(request("Rahim", vec![SaleLine::new("1001", 3)], 100), created_at)
            .await
            .unwrap();

        assert_eq!(invoice.transaction_id().value(), 1);
        assert_eq!(invoice.totals().due, Money::from_taka(200));
        assert_eq!(db.products().get_by_code("1001").await.unwrap().unwrap().quantity, 7);
        assert_eq!(db.invoices().get(invoice.id()).await.unwrap(), Some(invoice.clone()));

        let paid = ledger
            .apply_payment(invoice.id(), PaymentRequest::new(date(3), Money::from_taka(250)))
            .await
            .unwrap();
        assert!(paid.is_paid());
        assert_eq!(paid.payment_details()[0].absorbed, Money::from_taka(50));
        assert_eq!(paid.version(), 1);

        let err = ledger
            .apply_payment(invoice.id(), PaymentRequest::new(date(4), Money::from_taka(1)))
            .await
            .unwrap_err();
        assert!(err.validation().is_some());
    }

    #[tokio::test]
    async fn test_oversell_leaves_stock_untouched() {
        let (db, ledger) = ledger().await;

        let err = ledger
            .record_sale(request(
                "Karima",
                vec![SaleLine::new("1001", 1), SaleLine::new("1002", 3)],
                0,
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Core(CoreError::InsufficientStock { requested: 3, .. })
        ));

        let products = db.products();
        assert_eq!(products.get_by_code("1001").await.unwrap().unwrap().quantity, 10);
        assert_eq!(products.get_by_code("1002").await.unwrap().unwrap().quantity, 2);
        assert_eq!(db.invoices().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_low_stock_browse_and_report() {
        let (_db, ledger) = ledger().await;
        let day = |d| Utc.with_ymd_and_hms(2024, 5, d, 12, 0, 0).unwrap();

        ledger
            .record_sale_at(request("Rahim", vec![SaleLine::new("1001", 2)], 500), day(1))
            .await
            .unwrap();
        ledger
            .record_sale_at(request("Karima", vec![SaleLine::new("1001", 1)], 0), day(2))
            .await
            .unwrap();

        let low: Vec<String> = ledger
            .low_stock()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.code)
            .collect();
        assert_eq!(low, vec!["1002"]);

        let due = ledger
            .browse(&InvoiceQuery::default().with_status(StatusFilter::Due), 1, 10)
            .await
            .unwrap();
        assert_eq!(due.total_items, 1);
        assert_eq!(due.items[0].customer().name, "Karima");

        let report = ledger.report(date(1), date(31), None).await.unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].product_name, "Miniket Rice 5kg");
        assert_eq!(report.rows[0].total_quantity, 3);
        assert_eq!(report.total_amount, Money::from_taka(300));

        let empty = ledger.report(date(3), date(31), None).await.unwrap();
        assert!(empty.rows.is_empty());
    }
}
