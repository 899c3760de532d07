//! # dokan-core: Invoice & Payment Domain for Dokan
//!
//! The domain model behind the Dokan shop dashboard: invoices, installment
//! payments, stock alerts and sales reports. Everything here is a pure data
//! transformation; storage sits behind the traits in [`store`].
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dokan Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard pages (external)                      │   │
//! │  │   Sale form ─► Transactions ─► Payment details ─► Report        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed values (ts-rs bindings)          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dokan-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │ invoice  │ │ payment  │ │  stock   │ │  report  │          │   │
//! │  │   │ Totals   │ │ Record   │ │ low-stock│ │ ReportRow│          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │ listing  │ │validation│ │  ledger  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └────┬─────┘          │   │
//! │  │                                               │ store traits    │   │
//! │  └───────────────────────────────────────────────┼─────────────────┘   │
//! │                                                  │                      │
//! │  ┌───────────────────────────────────────────────▼─────────────────┐   │
//! │  │                 dokan-db (SQLite repositories)                  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer poisha amounts, parsing of form input
//! - [`types`] - Product, Customer, SaleSystem, StoreSettings
//! - [`invoice`] - Invoice aggregate and `create_invoice`
//! - [`payment`] - `Invoice::apply_payment` and installment records
//! - [`stock`] - Low-stock predicate and feed
//! - [`report`] - Sales report aggregation
//! - [`listing`] - Search, status filter, pagination
//! - [`store`] - Collaborator traits (+ in-memory implementations)
//! - [`ledger`] - Orchestration over the collaborators
//! - [`validation`], [`error`]
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{NaiveDate, Utc};
//! use dokan_core::invoice::{create_invoice, InvoiceDraft, LineItemDraft, TransactionId};
//! use dokan_core::payment::PaymentRequest;
//! use dokan_core::{Customer, Money, PaymentMethod, SaleSystem};
//!
//! let draft = InvoiceDraft {
//!     items: vec![
//!         LineItemDraft { product_name: "Rice 5kg".into(), quantity: 2, unit_price: Money::from_taka(100) },
//!         LineItemDraft { product_name: "Salt 1kg".into(), quantity: 1, unit_price: Money::from_taka(50) },
//!     ],
//!     customer: Customer::new("Karim", "01711000000"),
//!     payment_method: PaymentMethod::Cash,
//!     sale_system: SaleSystem::Retail,
//!     discount: Money::from_taka(20),
//!     initial_paid: Money::from_taka(100),
//!     due_date: None,
//! };
//!
//! let invoice = create_invoice(draft, "inv-1", TransactionId::new(1), Utc::now()).unwrap();
//! assert_eq!(invoice.totals().due, Money::from_taka(130));
//!
//! let today = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
//! let settled = invoice.apply_payment(PaymentRequest::new(today, Money::from_taka(130))).unwrap();
//! assert!(settled.is_paid());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod listing;
pub mod money;
pub mod payment;
pub mod report;
pub mod stock;
pub mod store;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use invoice::{create_invoice, Invoice, TransactionId, Totals};
pub use ledger::{Ledger, LedgerError};
pub use money::Money;
pub use payment::{PaymentRecord, PaymentRequest};
pub use report::{build_report, ReportRow};
pub use stock::{is_low_stock, list_low_stock};
pub use store::{InvoiceStore, ProductCatalog};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Rows per page on the transactions screen unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 10;
