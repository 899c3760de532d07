//! # Repository Module
//!
//! Database repository implementations for Dokan.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Ledger<ProductRepository, InvoiceRepository>                          │
//! │       │                                                                 │
//! │       │  catalog.adjust_stock("1001", -2)                              │
//! │       │  invoices.update(invoice)                                      │
//! │       ▼                                                                 │
//! │  ProductRepository / InvoiceRepository                                 │
//! │  ├── inherent methods (returning DbResult)                             │
//! │  └── dokan_core::ProductCatalog / InvoiceStore impls                   │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and guarded stock movement
//! - [`invoice::InvoiceRepository`] - Invoices, lines and installment history
//! - [`settings::SettingsRepository`] - Store profile

pub mod invoice;
pub mod product;
pub mod settings;
