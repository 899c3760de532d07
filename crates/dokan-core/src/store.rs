//! # Collaborator Interfaces
//!
//! The seams between the domain and whatever holds the data.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Ledger<C, S>                                  │
//! │                                                                         │
//! │     C: ProductCatalog                  S: InvoiceStore                  │
//! │     ├── list                           ├── next_transaction_id          │
//! │     ├── get_by_code                    ├── create / get / update        │
//! │     └── adjust_stock                   ├── delete                       │
//! │              │                         └── list / list_in_range         │
//! │              ▼                                    ▼                     │
//! │     dokan-db::ProductRepository        dokan-db::InvoiceRepository      │
//! │     store::memory::MemoryCatalog       store::memory::MemoryInvoiceStore│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each implementation brings its own error type; the ledger wraps it in
//! `LedgerError::Store`. "Not found" is reported as `Ok(None)` so the ledger
//! can turn it into `CoreError::NotFound`.

use chrono::NaiveDate;
use std::error::Error;
use std::future::Future;

use crate::invoice::{Invoice, TransactionId};
use crate::types::Product;

/// Read access to the product catalog plus stock movement.
pub trait ProductCatalog: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Active products, ordered by code.
    fn list(&self) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send;

    /// Looks up an active product by its code.
    fn get_by_code(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send;

    /// Adds `delta` (negative on sale) to the stock on hand and returns the
    /// updated product. Must fail rather than go below zero.
    fn adjust_stock(
        &self,
        code: &str,
        delta: i64,
    ) -> impl Future<Output = Result<Product, Self::Error>> + Send;
}

/// Invoice persistence.
pub trait InvoiceStore: Send + Sync {
    type Error: Error + Send + Sync + 'static;

    /// Reserves the next transaction id. Ids are never reissued.
    fn next_transaction_id(
        &self,
    ) -> impl Future<Output = Result<TransactionId, Self::Error>> + Send;

    fn create(&self, invoice: Invoice)
        -> impl Future<Output = Result<Invoice, Self::Error>> + Send;

    fn get(&self, id: &str) -> impl Future<Output = Result<Option<Invoice>, Self::Error>> + Send;

    fn get_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> impl Future<Output = Result<Option<Invoice>, Self::Error>> + Send;

    /// Replaces a stored invoice. Implementations reject a stale `version`
    /// and return the invoice stamped with its new version.
    fn update(&self, invoice: Invoice)
        -> impl Future<Output = Result<Invoice, Self::Error>> + Send;

    /// Deletes an invoice; `false` when there was nothing to delete.
    fn delete(&self, id: &str) -> impl Future<Output = Result<bool, Self::Error>> + Send;

    /// All invoices, newest transaction first.
    fn list(&self) -> impl Future<Output = Result<Vec<Invoice>, Self::Error>> + Send;

    /// Invoices whose sale date (UTC) falls in `[from, to]`, oldest first.
    fn list_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Invoice>, Self::Error>> + Send;
}

// =============================================================================
// In-Memory Implementations
// =============================================================================

/// Mutex-guarded in-memory collaborators, for tests and demos.
pub mod memory {
    use super::*;
    use crate::invoice::TransactionIdSequence;
    use std::collections::BTreeMap;
    use std::sync::{Mutex, MutexGuard, PoisonError};
    use thiserror::Error;

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum MemoryStoreError {
        #[error("no product with code {0}")]
        UnknownProduct(String),

        #[error("stock for {code} cannot go below zero (have {available}, change {delta})")]
        NegativeStock {
            code: String,
            available: i64,
            delta: i64,
        },

        #[error("invoice {0} already exists")]
        Duplicate(String),

        #[error("invoice {0} does not exist")]
        Missing(String),

        #[error("invoice {id} was modified concurrently (expected version {expected}, found {found})")]
        Conflict {
            id: String,
            expected: i64,
            found: i64,
        },

        #[error("transaction id space exhausted")]
        Exhausted,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Catalog keyed by product code.
    #[derive(Debug, Default)]
    pub struct MemoryCatalog {
        products: Mutex<BTreeMap<String, Product>>,
    }

    impl MemoryCatalog {
        pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
            let products = products
                .into_iter()
                .map(|p| (p.code.clone(), p))
                .collect();
            MemoryCatalog {
                products: Mutex::new(products),
            }
        }

        /// Marks a product inactive; it disappears from lookups.
        pub fn deactivate(&self, code: &str) -> bool {
            match lock(&self.products).get_mut(code) {
                Some(product) => {
                    product.is_active = false;
                    true
                }
                None => false,
            }
        }
    }

    impl ProductCatalog for MemoryCatalog {
        type Error = MemoryStoreError;

        async fn list(&self) -> Result<Vec<Product>, MemoryStoreError> {
            Ok(lock(&self.products)
                .values()
                .filter(|p| p.is_active)
                .cloned()
                .collect())
        }

        async fn get_by_code(&self, code: &str) -> Result<Option<Product>, MemoryStoreError> {
            Ok(lock(&self.products)
                .get(code)
                .filter(|p| p.is_active)
                .cloned())
        }

        async fn adjust_stock(&self, code: &str, delta: i64) -> Result<Product, MemoryStoreError> {
            let mut products = lock(&self.products);
            let product = products
                .get_mut(code)
                .filter(|p| p.is_active)
                .ok_or_else(|| MemoryStoreError::UnknownProduct(code.to_string()))?;

            let quantity = product.quantity + delta;
            if quantity < 0 {
                return Err(MemoryStoreError::NegativeStock {
                    code: code.to_string(),
                    available: product.quantity,
                    delta,
                });
            }
            product.quantity = quantity;
            Ok(product.clone())
        }
    }

    #[derive(Debug, Default)]
    struct InvoiceTable {
        sequence: TransactionIdSequence,
        rows: BTreeMap<String, Invoice>,
    }

    /// Invoice store keyed by id.
    #[derive(Debug, Default)]
    pub struct MemoryInvoiceStore {
        table: Mutex<InvoiceTable>,
    }

    impl MemoryInvoiceStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl InvoiceStore for MemoryInvoiceStore {
        type Error = MemoryStoreError;

        async fn next_transaction_id(&self) -> Result<TransactionId, MemoryStoreError> {
            lock(&self.table)
                .sequence
                .next()
                .ok_or(MemoryStoreError::Exhausted)
        }

        async fn create(&self, invoice: Invoice) -> Result<Invoice, MemoryStoreError> {
            let mut table = lock(&self.table);
            if table.rows.contains_key(invoice.id()) {
                return Err(MemoryStoreError::Duplicate(invoice.id().to_string()));
            }
            table.rows.insert(invoice.id().to_string(), invoice.clone());
            Ok(invoice)
        }

        async fn get(&self, id: &str) -> Result<Option<Invoice>, MemoryStoreError> {
            Ok(lock(&self.table).rows.get(id).cloned())
        }

        async fn get_by_transaction_id(
            &self,
            transaction_id: TransactionId,
        ) -> Result<Option<Invoice>, MemoryStoreError> {
            Ok(lock(&self.table)
                .rows
                .values()
                .find(|inv| inv.transaction_id() == transaction_id)
                .cloned())
        }

        async fn update(&self, invoice: Invoice) -> Result<Invoice, MemoryStoreError> {
            let mut table = lock(&self.table);
            let stored = table
                .rows
                .get_mut(invoice.id())
                .ok_or_else(|| MemoryStoreError::Missing(invoice.id().to_string()))?;

            if stored.version() != invoice.version() {
                return Err(MemoryStoreError::Conflict {
                    id: invoice.id().to_string(),
                    expected: invoice.version(),
                    found: stored.version(),
                });
            }

            let next_version = invoice.version() + 1;
            let updated = invoice.with_version(next_version);
            *stored = updated.clone();
            Ok(updated)
        }

        async fn delete(&self, id: &str) -> Result<bool, MemoryStoreError> {
            Ok(lock(&self.table).rows.remove(id).is_some())
        }

        async fn list(&self) -> Result<Vec<Invoice>, MemoryStoreError> {
            let mut invoices: Vec<Invoice> = lock(&self.table).rows.values().cloned().collect();
            invoices.sort_by(|a, b| b.transaction_id().cmp(&a.transaction_id()));
            Ok(invoices)
        }

        async fn list_in_range(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> Result<Vec<Invoice>, MemoryStoreError> {
            let mut invoices: Vec<Invoice> = lock(&self.table)
                .rows
                .values()
                .filter(|inv| inv.sale_date() >= from && inv.sale_date() <= to)
                .cloned()
                .collect();
            invoices.sort_by_key(|inv| (inv.created_at(), inv.transaction_id()));
            Ok(invoices)
        }
    }
}
