//! # Invoice Repository
//!
//! Database operations for invoices, their line items and installments.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices ──┬── invoice_items     (snapshot lines, by position)         │
//! │             └── payment_records   (append-only, by position)            │
//! │                                                                         │
//! │  sequences['invoice'] ── next_transaction_id()                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are reassembled into [`InvoiceParts`] and only become an
//! [`Invoice`] after [`Invoice::restore`] has reconciled the stored totals
//! against the lines and the installment history.
//!
//! ## Optimistic Versioning
//! Every update is `WHERE id = ? AND version = ?` and bumps the version.
//! A payment recorded from a stale copy matches zero rows and fails with
//! [`DbError::Conflict`] instead of overwriting the newer balance.

use chrono::{DateTime, NaiveDate, Utc};
use dokan_core::invoice::{InvoiceParts, LineItemDraft, TransactionId};
use dokan_core::{Customer, Invoice, InvoiceStore, Money, PaymentMethod, PaymentRecord, SaleSystem};
use sqlx::query::QueryAs;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};

const INVOICE_COLUMNS: &str = "id, transaction_id, created_at, due_date, next_due_date, \
     customer_name, customer_phone, payment_method, sale_system, \
     total, discount, payable, paid, due, initial_discount, initial_paid, version";

const ITEM_COLUMNS: &str = "invoice_id, product_name, quantity, unit_price";

const RECORD_COLUMNS: &str =
    "invoice_id, payment_date, discount, paid, absorbed, next_due_amount, next_due_date";

// =============================================================================
// Row Types
// =============================================================================

#[derive(Debug, FromRow)]
struct InvoiceRow {
    id: String,
    transaction_id: i64,
    created_at: DateTime<Utc>,
    due_date: Option<NaiveDate>,
    next_due_date: Option<NaiveDate>,
    customer_name: String,
    customer_phone: String,
    payment_method: PaymentMethod,
    sale_system: SaleSystem,
    total: Money,
    discount: Money,
    payable: Money,
    paid: Money,
    due: Money,
    initial_discount: Money,
    initial_paid: Money,
    version: i64,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    invoice_id: String,
    product_name: String,
    quantity: i64,
    unit_price: Money,
}

#[derive(Debug, FromRow)]
struct RecordRow {
    invoice_id: String,
    payment_date: NaiveDate,
    discount: Money,
    paid: Money,
    absorbed: Money,
    next_due_amount: Money,
    next_due_date: Option<NaiveDate>,
}

/// Which invoices a load covers.
#[derive(Debug, Clone, Copy)]
enum Scope<'a> {
    All,
    Id(&'a str),
    TransactionId(i64),
    Range(NaiveDate, NaiveDate),
}

impl Scope<'_> {
    fn clause(&self) -> &'static str {
        match self {
            Scope::All => "1 = 1",
            Scope::Id(_) => "id = ?1",
            Scope::TransactionId(_) => "transaction_id = ?1",
            Scope::Range(..) => "sale_date BETWEEN ?1 AND ?2",
        }
    }
}

fn scoped<'q, T>(sql: &'q str, scope: Scope<'q>) -> QueryAs<'q, Sqlite, T, SqliteArguments<'q>>
where
    T: for<'r> FromRow<'r, SqliteRow>,
{
    let query = sqlx::query_as::<_, T>(sql);
    match scope {
        Scope::All => query,
        Scope::Id(id) => query.bind(id),
        Scope::TransactionId(tid) => query.bind(tid),
        Scope::Range(from, to) => query.bind(from).bind(to),
    }
}

fn to_db_id(transaction_id: TransactionId) -> DbResult<i64> {
    i64::try_from(transaction_id.value()).map_err(|_| {
        DbError::Internal(format!("transaction id {transaction_id} does not fit in SQLite"))
    })
}

fn from_db_id(value: i64) -> DbResult<TransactionId> {
    u64::try_from(value)
        .map(TransactionId::new)
        .map_err(|_| DbError::Internal(format!("negative transaction id {value} in database")))
}

/// Groups child rows by invoice id, keeping their order.
fn group_by_invoice<R>(rows: Vec<R>, key: impl Fn(&R) -> &str) -> HashMap<String, Vec<R>> {
    let mut groups: HashMap<String, Vec<R>> = HashMap::new();
    for row in rows {
        groups.entry(key(&row).to_string()).or_default().push(row);
    }
    groups
}

fn assemble(row: InvoiceRow, items: Vec<ItemRow>, records: Vec<RecordRow>) -> DbResult<Invoice> {
    let parts = InvoiceParts {
        transaction_id: from_db_id(row.transaction_id)?,
        id: row.id,
        created_at: row.created_at,
        due_date: row.due_date,
        next_due_date: row.next_due_date,
        customer: Customer::new(row.customer_name, row.customer_phone),
        payment_method: row.payment_method,
        sale_system: row.sale_system,
        items: items
            .into_iter()
            .map(|item| LineItemDraft {
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
            .collect(),
        totals: dokan_core::Totals {
            total: row.total,
            discount: row.discount,
            payable: row.payable,
            paid: row.paid,
            due: row.due,
        },
        payment_details: records
            .into_iter()
            .map(|record| PaymentRecord {
                payment_date: record.payment_date,
                discount: record.discount,
                paid: record.paid,
                absorbed: record.absorbed,
                next_due_amount: record.next_due_amount,
                next_due_date: record.next_due_date,
            })
            .collect(),
        initial_discount: row.initial_discount,
        initial_paid: row.initial_paid,
        version: row.version,
    };

    Ok(Invoice::restore(parts)?)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice database operations.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    /// Creates a new InvoiceRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Loads every invoice in `scope` with its lines and installments.
    async fn load(&self, scope: Scope<'_>) -> DbResult<Vec<Invoice>> {
        let clause = scope.clause();

        let invoice_sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE {clause}");
        let item_sql = format!(
            "SELECT {ITEM_COLUMNS} FROM invoice_items \
             WHERE invoice_id IN (SELECT id FROM invoices WHERE {clause}) \
             ORDER BY invoice_id, position"
        );
        let record_sql = format!(
            "SELECT {RECORD_COLUMNS} FROM payment_records \
             WHERE invoice_id IN (SELECT id FROM invoices WHERE {clause}) \
             ORDER BY invoice_id, position"
        );

        let rows: Vec<InvoiceRow> = scoped(&invoice_sql, scope).fetch_all(&self.pool).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let items: Vec<ItemRow> = scoped(&item_sql, scope).fetch_all(&self.pool).await?;
        let records: Vec<RecordRow> = scoped(&record_sql, scope).fetch_all(&self.pool).await?;

        let mut items = group_by_invoice(items, |item| item.invoice_id.as_str());
        let mut records = group_by_invoice(records, |record| record.invoice_id.as_str());

        rows.into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                let history = records.remove(&row.id).unwrap_or_default();
                assemble(row, lines, history)
            })
            .collect()
    }

    /// Reserves the next transaction id from the persistent sequence.
    pub async fn next_transaction_id(&self) -> DbResult<TransactionId> {
        let value: i64 = sqlx::query_scalar(
            "UPDATE sequences SET value = value + 1 WHERE name = 'invoice' RETURNING value",
        )
        .fetch_one(&self.pool)
        .await?;

        from_db_id(value)
    }

    /// Inserts an invoice with its lines and any installments, atomically.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Stored invoice
    /// * `Err(DbError::UniqueViolation)` - Id or transaction id already used
    pub async fn create(&self, invoice: Invoice) -> DbResult<Invoice> {
        debug!(id = %invoice.id(), transaction_id = %invoice.transaction_id(), "Inserting invoice");

        let transaction_id = to_db_id(invoice.transaction_id())?;
        let totals = invoice.totals();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO invoices (
                id, transaction_id, created_at, sale_date, due_date, next_due_date,
                customer_name, customer_phone, payment_method, sale_system,
                total, discount, payable, paid, due,
                initial_discount, initial_paid, version, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8, ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17, ?18, ?19
            )
            "#,
        )
        .bind(invoice.id())
        .bind(transaction_id)
        .bind(invoice.created_at())
        .bind(invoice.sale_date())
        .bind(invoice.due_date())
        .bind(invoice.next_due_date())
        .bind(&invoice.customer().name)
        .bind(&invoice.customer().phone)
        .bind(invoice.payment_method())
        .bind(invoice.sale_system())
        .bind(totals.total)
        .bind(totals.discount)
        .bind(totals.payable)
        .bind(totals.paid)
        .bind(totals.due)
        .bind(invoice.initial_discount())
        .bind(invoice.initial_paid())
        .bind(invoice.version())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| match DbError::from(err) {
            DbError::UniqueViolation { field, .. } if field.ends_with("transaction_id") => {
                DbError::duplicate(field, invoice.transaction_id().to_string())
            }
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, invoice.id()),
            other => other,
        })?;

        for (position, item) in invoice.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO invoice_items (
                    invoice_id, position, product_name, quantity, unit_price, line_total
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(invoice.id())
            .bind(position as i64)
            .bind(item.product_name())
            .bind(item.quantity())
            .bind(item.unit_price())
            .bind(item.line_total())
            .execute(&mut *tx)
            .await?;
        }

        insert_records(&mut tx, invoice.id(), invoice.payment_details(), 0).await?;

        tx.commit().await?;
        Ok(invoice)
    }

    /// Gets an invoice by its id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        Ok(self.load(Scope::Id(id)).await?.into_iter().next())
    }

    /// Gets an invoice by its printed transaction number.
    pub async fn get_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> DbResult<Option<Invoice>> {
        let tid = to_db_id(transaction_id)?;
        Ok(self.load(Scope::TransactionId(tid)).await?.into_iter().next())
    }

    /// Stores the payment state of an invoice.
    ///
    /// Lines and customer are immutable after creation; only the balance,
    /// the next due date and newly appended installments are written.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - The invoice stamped with its new version
    /// * `Err(DbError::Conflict)` - Stored version differs, or the stored
    ///   history is longer than the one supplied
    /// * `Err(DbError::NotFound)` - No such invoice
    pub async fn update(&self, invoice: Invoice) -> DbResult<Invoice> {
        debug!(id = %invoice.id(), version = invoice.version(), "Updating invoice");

        let totals = invoice.totals();
        let conflict = || DbError::Conflict {
            entity: "Invoice".to_string(),
            id: invoice.id().to_string(),
            expected: invoice.version(),
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                next_due_date = ?3,
                discount = ?4,
                payable = ?5,
                paid = ?6,
                due = ?7,
                version = version + 1,
                updated_at = ?8
            WHERE id = ?1 AND version = ?2
            "#,
        )
        .bind(invoice.id())
        .bind(invoice.version())
        .bind(invoice.next_due_date())
        .bind(totals.discount)
        .bind(totals.payable)
        .bind(totals.paid)
        .bind(totals.due)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            let exists: Option<i64> = sqlx::query_scalar("SELECT version FROM invoices WHERE id = ?1")
                .bind(invoice.id())
                .fetch_optional(&mut *tx)
                .await?;

            return Err(match exists {
                Some(_) => conflict(),
                None => DbError::not_found("Invoice", invoice.id()),
            });
        }

        let stored: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM payment_records WHERE invoice_id = ?1")
                .bind(invoice.id())
                .fetch_one(&mut *tx)
                .await?;
        let stored = usize::try_from(stored).unwrap_or(usize::MAX);

        let history = invoice.payment_details();
        if stored > history.len() {
            return Err(conflict());
        }
        insert_records(&mut tx, invoice.id(), &history[stored..], stored).await?;

        tx.commit().await?;

        let next_version = invoice.version() + 1;
        Ok(invoice.with_version(next_version))
    }

    /// Deletes an invoice; lines and installments go with it.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting invoice");

        let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All invoices, newest transaction first.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        let mut invoices = self.load(Scope::All).await?;
        invoices.sort_by(|a, b| b.transaction_id().cmp(&a.transaction_id()));
        Ok(invoices)
    }

    /// Invoices sold on `[from, to]` (UTC dates), oldest first.
    pub async fn list_in_range(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Invoice>> {
        let mut invoices = self.load(Scope::Range(from, to)).await?;
        invoices.sort_by_key(|inv| (inv.created_at(), inv.transaction_id()));

        debug!(%from, %to, count = invoices.len(), "Listed invoices in range");
        Ok(invoices)
    }

    /// Counts stored invoices (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn insert_records(
    tx: &mut Transaction<'_, Sqlite>,
    invoice_id: &str,
    records: &[PaymentRecord],
    first_position: usize,
) -> DbResult<()> {
    for (offset, record) in records.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO payment_records (
                invoice_id, position, payment_date, discount, paid,
                absorbed, next_due_amount, next_due_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(invoice_id)
        .bind((first_position + offset) as i64)
        .bind(record.payment_date)
        .bind(record.discount)
        .bind(record.paid)
        .bind(record.absorbed)
        .bind(record.next_due_amount)
        .bind(record.next_due_date)
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

impl InvoiceStore for InvoiceRepository {
    type Error = DbError;

    async fn next_transaction_id(&self) -> DbResult<TransactionId> {
        InvoiceRepository::next_transaction_id(self).await
    }

    async fn create(&self, invoice: Invoice) -> DbResult<Invoice> {
        InvoiceRepository::create(self, invoice).await
    }

    async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        InvoiceRepository::get(self, id).await
    }

    async fn get_by_transaction_id(
        &self,
        transaction_id: TransactionId,
    ) -> DbResult<Option<Invoice>> {
        InvoiceRepository::get_by_transaction_id(self, transaction_id).await
    }

    async fn update(&self, invoice: Invoice) -> DbResult<Invoice> {
        InvoiceRepository::update(self, invoice).await
    }

    async fn delete(&self, id: &str) -> DbResult<bool> {
        InvoiceRepository::delete(self, id).await
    }

    async fn list(&self) -> DbResult<Vec<Invoice>> {
        InvoiceRepository::list(self).await
    }

    async fn list_in_range(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<Invoice>> {
        InvoiceRepository::list_in_range(self, from, to).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
