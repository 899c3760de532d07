//! # Ledger
//!
//! Sequences domain operations over the injected catalog and invoice store.
//! The ledger does no I/O of its own.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleRequest                                                            │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  1. validate customer + lines                                           │
//! │  2. resolve every code via catalog   ── missing ──► NotFound (no writes)│
//! │  3. check stock per code             ── short ────► InsufficientStock   │
//! │  4. validate the invoice draft                                          │
//! │  5. reserve transaction id                                              │
//! │  6. create_invoice (snapshot names + channel prices)                    │
//! │  7. move stock line by line  ── failure ─► restore moved lines, fail    │
//! │  8. persist invoice          ── failure ─► restore all lines, fail      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A reserved transaction id that ends up unused stays unused.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::invoice::{create_invoice, Invoice, InvoiceDraft, LineItemDraft, TransactionId};
use crate::listing::{filter_invoices, paginate, InvoiceQuery, Page};
use crate::money::Money;
use crate::payment::{PaymentHistory, PaymentRequest};
use crate::report::{build_report, ReportStatement};
use crate::stock::{check_availability, list_low_stock, low_stock_summary, LowStockSummary};
use crate::store::{InvoiceStore, ProductCatalog};
use crate::types::{Customer, PaymentMethod, Product, SaleSystem, StoreSettings};
use crate::validation::{validate_customer, validate_line_quantity};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A collaborator (catalog or invoice store) failed.
    #[error("store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        LedgerError::Store(Box::new(err))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::Core(CoreError::NotFound { .. }))
    }

    /// The validation failure behind this error, if that is what it is.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            LedgerError::Core(CoreError::Validation(err)) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::Core(CoreError::Validation(err))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLine {
    pub code: String,
    pub quantity: i64,
}

impl SaleLine {
    pub fn new(code: impl Into<String>, quantity: i64) -> Self {
        SaleLine {
            code: code.into(),
            quantity,
        }
    }
}

/// A sale as entered at the counter: product codes, not prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleRequest {
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    pub sale_system: SaleSystem,
    pub lines: Vec<SaleLine>,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub initial_paid: Money,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

// =============================================================================
// Ledger
// =============================================================================

pub struct Ledger<C, S> {
    catalog: C,
    invoices: S,
}

impl<C, S> Ledger<C, S>
where
    C: ProductCatalog,
    S: InvoiceStore,
{
    pub fn new(catalog: C, invoices: S) -> Self {
        Ledger { catalog, invoices }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn invoices(&self) -> &S {
        &self.invoices
    }

    /// Records a sale dated now.
    pub async fn record_sale(&self, request: SaleRequest) -> LedgerResult<Invoice> {
        self.record_sale_at(request, Utc::now()).await
    }

    /// Records a sale with an explicit timestamp (imports, seeding).
    pub async fn record_sale_at(
        &self,
        request: SaleRequest,
        created_at: DateTime<Utc>,
    ) -> LedgerResult<Invoice> {
        validate_customer(&request.customer)?;
        if request.lines.is_empty() {
            return Err(ValidationError::Empty {
                field: "lines".to_string(),
            }
            .into());
        }
        for line in &request.lines {
            validate_line_quantity(line.quantity)?;
        }

        // Resolve everything before touching stock.
        let mut products: HashMap<&str, Product> = HashMap::new();
        let mut requested: HashMap<&str, i64> = HashMap::new();
        for line in &request.lines {
            if !products.contains_key(line.code.as_str()) {
                let product = self
                    .catalog
                    .get_by_code(&line.code)
                    .await
                    .map_err(LedgerError::store)?
                    .ok_or_else(|| CoreError::not_found("Product", &line.code))?;
                products.insert(line.code.as_str(), product);
            }
            let total = requested.entry(line.code.as_str()).or_insert(0);
            *total = total.saturating_add(line.quantity);
        }
        for (code, quantity) in &requested {
            if let Some(product) = products.get(code) {
                check_availability(product, *quantity)?;
            }
        }

        let items = request
            .lines
            .iter()
            .filter_map(|line| {
                products.get(line.code.as_str()).map(|product| LineItemDraft {
                    product_name: product.name.clone(),
                    quantity: line.quantity,
                    unit_price: product.unit_price(request.sale_system),
                })
            })
            .collect();
        let draft = InvoiceDraft {
            items,
            customer: request.customer.clone(),
            payment_method: request.payment_method,
            sale_system: request.sale_system,
            discount: request.discount,
            initial_paid: request.initial_paid,
            due_date: request.due_date,
        };
        draft.validate()?;

        let transaction_id = self
            .invoices
            .next_transaction_id()
            .await
            .map_err(LedgerError::store)?;
        let invoice = create_invoice(
            draft,
            uuid::Uuid::new_v4().to_string(),
            transaction_id,
            created_at,
        )?;

        let mut moved: Vec<&SaleLine> = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            if let Err(err) = self.catalog.adjust_stock(&line.code, -line.quantity).await {
                self.restock(&moved).await;
                return Err(LedgerError::store(err));
            }
            moved.push(line);
        }

        let invoice = match self.invoices.create(invoice).await {
            Ok(invoice) => invoice,
            Err(err) => {
                self.restock(&moved).await;
                return Err(LedgerError::store(err));
            }
        };

        info!(
            transaction_id = %invoice.transaction_id(),
            sale_system = %invoice.sale_system(),
            total = %invoice.totals().total,
            due = %invoice.totals().due,
            "Sale recorded"
        );
        Ok(invoice)
    }

    /// Puts back stock for lines already moved by a failed sale.
    async fn restock(&self, moved: &[&SaleLine]) {
        for line in moved.iter().rev() {
            warn!(code = %line.code, quantity = line.quantity, "Restoring stock after failed sale");
            if let Err(err) = self.catalog.adjust_stock(&line.code, line.quantity).await {
                warn!(code = %line.code, error = %err, "Could not restore stock");
            }
        }
    }

    /// Applies an installment to a stored invoice and persists the result.
    pub async fn apply_payment(&self, id: &str, request: PaymentRequest) -> LedgerResult<Invoice> {
        let invoice = self.invoice(id).await?;
        let updated = invoice.apply_payment(request)?;
        let record = updated
            .payment_details()
            .last()
            .map(|r| (r.paid, r.absorbed));

        let saved = self
            .invoices
            .update(updated)
            .await
            .map_err(LedgerError::store)?;

        if let Some((paid, absorbed)) = record {
            info!(
                transaction_id = %saved.transaction_id(),
                paid = %paid,
                absorbed = %absorbed,
                due = %saved.totals().due,
                "Payment applied"
            );
        }
        Ok(saved)
    }

    /// Deletes an invoice. Stock is not returned.
    pub async fn delete_invoice(&self, id: &str) -> LedgerResult<()> {
        let deleted = self.invoices.delete(id).await.map_err(LedgerError::store)?;
        if !deleted {
            return Err(CoreError::not_found("Invoice", id).into());
        }
        info!(id, "Invoice deleted");
        Ok(())
    }

    pub async fn invoice(&self, id: &str) -> LedgerResult<Invoice> {
        self.invoices
            .get(id)
            .await
            .map_err(LedgerError::store)?
            .ok_or_else(|| CoreError::not_found("Invoice", id).into())
    }

    pub async fn payment_history(
        &self,
        transaction_id: TransactionId,
    ) -> LedgerResult<PaymentHistory> {
        let invoice = self
            .invoices
            .get_by_transaction_id(transaction_id)
            .await
            .map_err(LedgerError::store)?
            .ok_or_else(|| CoreError::not_found("Invoice", transaction_id.to_string()))?;
        Ok(PaymentHistory::from(&invoice))
    }

    /// Filters then paginates the invoice list (newest first).
    pub async fn browse(
        &self,
        query: &InvoiceQuery,
        page: usize,
        page_size: usize,
    ) -> LedgerResult<Page<Invoice>> {
        query.validate()?;
        let invoices = self.invoices.list().await.map_err(LedgerError::store)?;
        let matched: Vec<Invoice> = filter_invoices(&invoices, query)
            .into_iter()
            .cloned()
            .collect();
        debug!(matched = matched.len(), page, page_size, "Browsing invoices");
        Ok(paginate(matched, page, page_size))
    }

    pub async fn low_stock(&self) -> LedgerResult<Vec<Product>> {
        let products = self.catalog.list().await.map_err(LedgerError::store)?;
        Ok(list_low_stock(&products).into_iter().cloned().collect())
    }

    pub async fn low_stock_summary(&self) -> LedgerResult<LowStockSummary> {
        let products = self.catalog.list().await.map_err(LedgerError::store)?;
        Ok(low_stock_summary(&products))
    }

    /// Sales report for `[from, to]` with an optional store header.
    pub async fn report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        store: Option<StoreSettings>,
    ) -> LedgerResult<ReportStatement> {
        if from > to {
            return Ok(ReportStatement::new(store, from, to, Vec::new()));
        }
        let invoices = self
            .invoices
            .list_in_range(from, to)
            .await
            .map_err(LedgerError::store)?;
        let rows = build_report(&invoices, from, to);
        debug!(invoices = invoices.len(), rows = rows.len(), "Report built");
        Ok(ReportStatement::new(store, from, to, rows))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
