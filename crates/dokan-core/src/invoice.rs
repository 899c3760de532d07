//! # Invoice Aggregate
//!
//! One sale transaction: snapshot line items, totals and the installment
//! history.
//!
//! ## Totals Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Invoice Totals                                  │
//! │                                                                         │
//! │  LineItem: qty 2 × ৳100 = ৳200  ┐                                       │
//! │  LineItem: qty 1 × ৳50  = ৳50   ┴─► total    ৳250                       │
//! │                                     discount  ৳20  (clamped to total)   │
//! │                                     payable  ৳230  = total - discount   │
//! │                                     paid     ৳100  = clamp(0, payable)  │
//! │                                     due      ৳130  = payable - paid     │
//! │                                                                         │
//! │  After creation, totals change ONLY through `Invoice::apply_payment`,   │
//! │  which appends a PaymentRecord (see payment.rs).                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Identity
//! - `id`: UUID v4, storage key
//! - `transaction_id`: sequential, human-facing, never reissued
//!
//! ## Loading from Storage
//! Fields are private. A stored invoice comes back through
//! [`Invoice::restore`], which recomputes line totals and re-checks every
//! reconciliation rule before handing out a value.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::payment::PaymentRecord;
use crate::types::{Customer, PaymentMethod, SaleSystem};
use crate::validation::{
    validate_amount, validate_line_quantity, validate_name, validate_non_negative, ValidationResult,
};

// =============================================================================
// Transaction Id
// =============================================================================

/// Human-facing invoice number printed on receipts ("#1042").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct TransactionId(u64);

impl TransactionId {
    #[inline]
    pub const fn new(value: u64) -> Self {
        TransactionId(value)
    }

    #[inline]
    pub const fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues strictly increasing transaction ids.
///
/// A sequence only moves forward: deleting an invoice never frees its number.
/// Stores persist `last_issued()` and resume with [`TransactionIdSequence::starting_after`].
///
/// ## Example
/// ```rust
/// use dokan_core::invoice::{TransactionId, TransactionIdSequence};
///
/// let mut seq = TransactionIdSequence::starting_after(TransactionId::new(41));
/// assert_eq!(seq.next(), Some(TransactionId::new(42)));
/// assert_eq!(seq.last_issued(), Some(TransactionId::new(42)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransactionIdSequence {
    last: u64,
}

impl TransactionIdSequence {
    /// A fresh sequence; the first id issued is 1.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_after(last: TransactionId) -> Self {
        TransactionIdSequence { last: last.0 }
    }

    /// The most recently issued id, if any.
    pub fn last_issued(&self) -> Option<TransactionId> {
        (self.last > 0).then_some(TransactionId(self.last))
    }
}

impl Iterator for TransactionIdSequence {
    type Item = TransactionId;

    /// Returns `None` only once the id space is exhausted.
    fn next(&mut self) -> Option<TransactionId> {
        self.last = self.last.checked_add(1)?;
        Some(TransactionId(self.last))
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// Line item input, as entered at the counter or read back from storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemDraft {
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// A sold line. The product name is a snapshot; renaming or deleting the
/// product later does not touch existing invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    product_name: String,
    quantity: i64,
    unit_price: Money,
    line_total: Money,
}

impl LineItem {
    /// Validates a line and computes `line_total = quantity × unit_price`.
    pub fn new(
        product_name: impl Into<String>,
        quantity: i64,
        unit_price: Money,
    ) -> ValidationResult<Self> {
        let product_name = product_name.into();
        validate_name("productName", &product_name)?;
        validate_line_quantity(quantity)?;
        validate_amount("unitPrice", unit_price)?;
        let line_total = unit_price.checked_multiply_quantity(quantity).ok_or_else(|| {
            ValidationError::OutOfRange {
                field: "lineTotal".to_string(),
                min: 0,
                max: i64::MAX,
            }
        })?;

        Ok(LineItem {
            product_name,
            quantity,
            unit_price,
            line_total,
        })
    }

    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn line_total(&self) -> Money {
        self.line_total
    }

    fn to_draft(&self) -> LineItemDraft {
        LineItemDraft {
            product_name: self.product_name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price,
        }
    }
}

impl TryFrom<LineItemDraft> for LineItem {
    type Error = ValidationError;

    fn try_from(draft: LineItemDraft) -> ValidationResult<Self> {
        LineItem::new(draft.product_name, draft.quantity, draft.unit_price)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Invoice-level figures.
///
/// ## Invariants
/// - `payable == total - discount`, `payable >= 0`
/// - `0 <= paid <= payable`
/// - `due == payable - paid` (so `due >= 0`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub total: Money,
    pub discount: Money,
    pub payable: Money,
    pub paid: Money,
    pub due: Money,
}

impl Totals {
    /// Derives consistent totals from a gross total, a requested discount and
    /// a tendered amount. Discount is clamped to `[0, total]` and the paid
    /// amount to `[0, payable]`.
    ///
    /// ```rust
    /// use dokan_core::invoice::Totals;
    /// use dokan_core::money::Money;
    ///
    /// let t = Totals::settle(Money::from_taka(250), Money::from_taka(20), Money::from_taka(100));
    /// assert_eq!(t.payable, Money::from_taka(230));
    /// assert_eq!(t.due, Money::from_taka(130));
    /// ```
    pub fn settle(total: Money, discount: Money, paid: Money) -> Self {
        let discount = discount.clamp_non_negative().min(total);
        let payable = total - discount;
        let paid = paid.clamp_non_negative().min(payable);

        Totals {
            total,
            discount,
            payable,
            paid,
            due: payable - paid,
        }
    }

    pub fn is_consistent(&self) -> bool {
        !self.total.is_negative()
            && !self.discount.is_negative()
            && !self.paid.is_negative()
            && self.payable == self.total - self.discount
            && !self.payable.is_negative()
            && self.paid <= self.payable
            && self.due == self.payable - self.paid
    }

    /// Fully settled: nothing left to collect.
    pub fn is_paid(&self) -> bool {
        self.due.is_zero()
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Everything the counter supplies for a new sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub items: Vec<LineItemDraft>,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    pub sale_system: SaleSystem,
    pub discount: Money,
    /// Amount tendered at the counter. Clamped to `[0, payable]`.
    pub initial_paid: Money,
    /// Advisory only; an invoice with a due balance and no date is open credit.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
}

impl InvoiceDraft {
    /// Checks the draft without building anything, so callers can reject bad
    /// input before reserving a transaction id.
    pub fn validate(&self) -> ValidationResult<()> {
        gross_total(&self.line_items()?)?;
        validate_amount("discount", self.discount)
    }

    fn line_items(&self) -> ValidationResult<Vec<LineItem>> {
        if self.items.is_empty() {
            return Err(ValidationError::Empty {
                field: "items".to_string(),
            });
        }
        self.items.iter().cloned().map(LineItem::try_from).collect()
    }
}

/// Sum of the line totals; `OutOfRange` if it does not fit in [`Money`].
fn gross_total(items: &[LineItem]) -> ValidationResult<Money> {
    Money::checked_sum(items.iter().map(LineItem::line_total)).ok_or_else(|| {
        ValidationError::OutOfRange {
            field: "totals.total".to_string(),
            min: 0,
            max: i64::MAX,
        }
    })
}

/// Builds a new invoice from a sale draft.
///
/// ## Errors
/// `ValidationError` when the item list is empty, a quantity is not
/// positive, a unit price or the discount is negative or out of range, or
/// the total does not fit. Nothing is built on failure.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use dokan_core::invoice::{create_invoice, InvoiceDraft, LineItemDraft, TransactionId};
/// use dokan_core::money::Money;
/// use dokan_core::types::{Customer, PaymentMethod, SaleSystem};
///
/// let draft = InvoiceDraft {
///     items: vec![LineItemDraft {
///         product_name: "Soybean Oil 1L".into(),
///         quantity: 2,
///         unit_price: Money::from_taka(100),
///     }],
///     customer: Customer::new("Karim", "01711000000"),
///     payment_method: PaymentMethod::Cash,
///     sale_system: SaleSystem::Retail,
///     discount: Money::zero(),
///     initial_paid: Money::from_taka(50),
///     due_date: None,
/// };
///
/// let invoice = create_invoice(draft, "inv-1", TransactionId::new(1), Utc::now()).unwrap();
/// assert_eq!(invoice.totals().due, Money::from_taka(150));
/// ```
pub fn create_invoice(
    draft: InvoiceDraft,
    id: impl Into<String>,
    transaction_id: TransactionId,
    created_at: DateTime<Utc>,
) -> ValidationResult<Invoice> {
    let items = draft.line_items()?;
    let total = gross_total(&items)?;
    validate_amount("discount", draft.discount)?;

    let totals = Totals::settle(total, draft.discount, draft.initial_paid);

    Ok(Invoice {
        id: id.into(),
        transaction_id,
        created_at,
        due_date: draft.due_date,
        next_due_date: None,
        customer: draft.customer,
        payment_method: draft.payment_method,
        sale_system: draft.sale_system,
        items,
        totals,
        payment_details: Vec::new(),
        initial_discount: totals.discount,
        initial_paid: totals.paid,
        version: 0,
    })
}

// =============================================================================
// Invoice
// =============================================================================

/// A sale transaction.
///
/// ## Invariants
/// - `items` is never empty
/// - `totals` satisfies [`Totals::is_consistent`]
/// - `totals.paid == initial_paid + Σ payment_details.paid`
/// - `totals.discount == initial_discount + Σ payment_details.discount`
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub(crate) id: String,
    pub(crate) transaction_id: TransactionId,
    #[ts(as = "String")]
    pub(crate) created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub(crate) due_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub(crate) next_due_date: Option<NaiveDate>,
    pub(crate) customer: Customer,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) sale_system: SaleSystem,
    pub(crate) items: Vec<LineItem>,
    pub(crate) totals: Totals,
    pub(crate) payment_details: Vec<PaymentRecord>,
    pub(crate) initial_discount: Money,
    pub(crate) initial_paid: Money,
    pub(crate) version: i64,
}

impl Invoice {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Calendar date of the sale (UTC).
    pub fn sale_date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Date promised by the latest installment, if the invoice is still open.
    pub fn next_due_date(&self) -> Option<NaiveDate> {
        self.next_due_date
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn sale_system(&self) -> SaleSystem {
        self.sale_system
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn totals(&self) -> &Totals {
        &self.totals
    }

    pub fn payment_details(&self) -> &[PaymentRecord] {
        &self.payment_details
    }

    pub fn initial_discount(&self) -> Money {
        self.initial_discount
    }

    pub fn initial_paid(&self) -> Money {
        self.initial_paid
    }

    /// Optimistic-concurrency counter maintained by the store.
    pub fn version(&self) -> i64 {
        self.version
    }

    pub fn is_paid(&self) -> bool {
        self.totals.is_paid()
    }

    /// Returns the invoice stamped with a new store version.
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    /// Rebuilds an invoice from its stored parts.
    ///
    /// The invoice is rebuilt the way it was first built: line totals are
    /// recomputed, the counter figures are settled again and every stored
    /// installment is re-applied through [`Invoice::apply_payment`]. The
    /// stored totals, records and next due date must match the replay exactly
    /// or the load fails with [`ValidationError::Inconsistent`].
    pub fn restore(parts: InvoiceParts) -> ValidationResult<Self> {
        if parts.items.is_empty() {
            return Err(ValidationError::Empty {
                field: "items".to_string(),
            });
        }
        if parts.version < 0 {
            return Err(ValidationError::negative("version"));
        }
        let items = parts
            .items
            .into_iter()
            .map(LineItem::try_from)
            .collect::<ValidationResult<Vec<_>>>()?;

        let gross = gross_total(&items)?;
        if parts.totals.total != gross {
            return Err(ValidationError::inconsistent(
                "totals.total",
                format!("stored {} but line items sum to {}", parts.totals.total, gross),
            ));
        }

        validate_non_negative("initialDiscount", parts.initial_discount)?;
        validate_non_negative("initialPaid", parts.initial_paid)?;
        let opening = Totals::settle(gross, parts.initial_discount, parts.initial_paid);
        if opening.discount != parts.initial_discount {
            return Err(ValidationError::inconsistent(
                "initialDiscount",
                "exceeds the invoice total",
            ));
        }
        if opening.paid != parts.initial_paid {
            return Err(ValidationError::inconsistent(
                "initialPaid",
                "exceeds the amount payable at creation",
            ));
        }

        let mut invoice = Invoice {
            id: parts.id,
            transaction_id: parts.transaction_id,
            created_at: parts.created_at,
            due_date: parts.due_date,
            next_due_date: None,
            customer: parts.customer,
            payment_method: parts.payment_method,
            sale_system: parts.sale_system,
            items,
            totals: opening,
            payment_details: Vec::with_capacity(parts.payment_details.len()),
            initial_discount: parts.initial_discount,
            initial_paid: parts.initial_paid,
            version: parts.version,
        };
        for record in &parts.payment_details {
            invoice = invoice.replay(record)?;
        }

        let stored = parts.totals;
        let replayed = invoice.totals;
        for (field, kept, derived) in [
            ("totals.discount", stored.discount, replayed.discount),
            ("totals.payable", stored.payable, replayed.payable),
            ("totals.paid", stored.paid, replayed.paid),
            ("totals.due", stored.due, replayed.due),
        ] {
            if kept != derived {
                return Err(ValidationError::inconsistent(
                    field,
                    format!("stored {} but history adds up to {}", kept, derived),
                ));
            }
        }
        if parts.next_due_date != invoice.next_due_date {
            return Err(ValidationError::inconsistent(
                "nextDueDate",
                "does not match the latest installment",
            ));
        }

        Ok(invoice)
    }

    /// Splits the invoice into its storable parts.
    pub fn to_parts(&self) -> InvoiceParts {
        InvoiceParts {
            id: self.id.clone(),
            transaction_id: self.transaction_id,
            created_at: self.created_at,
            due_date: self.due_date,
            next_due_date: self.next_due_date,
            customer: self.customer.clone(),
            payment_method: self.payment_method,
            sale_system: self.sale_system,
            items: self.items.iter().map(LineItem::to_draft).collect(),
            totals: self.totals,
            payment_details: self.payment_details.clone(),
            initial_discount: self.initial_discount,
            initial_paid: self.initial_paid,
            version: self.version,
        }
    }
}

/// Storage representation of an [`Invoice`]. Nothing here is trusted until
/// it passes [`Invoice::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceParts {
    pub id: String,
    pub transaction_id: TransactionId,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<NaiveDate>,
    pub next_due_date: Option<NaiveDate>,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
    pub sale_system: SaleSystem,
    pub items: Vec<LineItemDraft>,
    pub totals: Totals,
    pub payment_details: Vec<PaymentRecord>,
    pub initial_discount: Money,
    pub initial_paid: Money,
    pub version: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    pub(crate) fn line(name: &str, quantity: i64, taka: i64) -> LineItemDraft {
        LineItemDraft {
            product_name: name.to_string(),
            quantity,
            unit_price: Money::from_taka(taka),
        }
    }

    pub(crate) fn draft(items: Vec<LineItemDraft>, discount: i64, paid: i64) -> InvoiceDraft {
        InvoiceDraft {
            items,
            customer: Customer::new("Karim Uddin", "01711000000"),
            payment_method: PaymentMethod::Cash,
            sale_system: SaleSystem::Retail,
            discount: Money::from_taka(discount),
            initial_paid: Money::from_taka(paid),
            due_date: None,
        }
    }

    /// The two-line counter sale: 2 × ৳100 + 1 × ৳50, ৳20 off, ৳100 paid.
    pub(crate) fn counter_sale(transaction_id: u64) -> Invoice {
        let d = draft(vec![line("Rice 5kg", 2, 100), line("Salt 1kg", 1, 50)], 20, 100);
        create_invoice(
            d,
            format!("inv-{transaction_id}"),
            TransactionId::new(transaction_id),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_counter_sale_totals() {
        let invoice = counter_sale(1);
        let t = invoice.totals();

        assert_eq!(t.total, Money::from_taka(250));
        assert_eq!(t.discount, Money::from_taka(20));
        assert_eq!(t.payable, Money::from_taka(230));
        assert_eq!(t.paid, Money::from_taka(100));
        assert_eq!(t.due, Money::from_taka(130));
        assert!(invoice.payment_details().is_empty());
        assert_eq!(invoice.initial_paid(), Money::from_taka(100));
        assert_eq!(invoice.items()[0].line_total(), Money::from_taka(200));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let err = create_invoice(draft(vec![], 0, 0), "x", TransactionId::new(1), Utc::now())
            .unwrap_err();
        assert_eq!(err.field(), "items");

        let err = create_invoice(
            draft(vec![line("Rice", 0, 100)], 0, 0),
            "x",
            TransactionId::new(1),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.field(), "quantity");

        let err = create_invoice(
            draft(vec![line("Rice", 1, -1)], 0, 0),
            "x",
            TransactionId::new(1),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.field(), "unitPrice");

        let err = create_invoice(
            draft(vec![line("Rice", 1, 10)], -5, 0),
            "x",
            TransactionId::new(1),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.field(), "discount");
    }

    #[test]
    fn test_overpaid_and_overdiscounted_creation_is_clamped() {
        // tendered more than payable
        let invoice = create_invoice(
            draft(vec![line("Rice", 1, 100)], 0, 500),
            "a",
            TransactionId::new(1),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(invoice.totals().paid, Money::from_taka(100));
        assert!(invoice.is_paid());

        // discount larger than the whole sale
        let invoice = create_invoice(
            draft(vec![line("Rice", 1, 100)], 150, 0),
            "b",
            TransactionId::new(2),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(invoice.totals().discount, Money::from_taka(100));
        assert_eq!(invoice.totals().payable, Money::zero());
        assert!(invoice.totals().is_consistent());
    }

    #[test]
    fn test_oversized_lines_are_rejected() {
        let mut huge = line("Rice 5kg", 1, 0);
        huge.quantity = 200_000_000_000;
        huge.unit_price = Money::from_taka(1_000_000);
        let err = create_invoice(draft(vec![huge], 0, 0), "inv-1", TransactionId::new(1), Utc::now())
            .unwrap_err();
        assert_eq!(err.field(), "quantity");

        let mut pricey = line("Rice 5kg", 1, 0);
        pricey.unit_price = Money::from_poisha(i64::MAX);
        let d = draft(vec![pricey, line("Salt 1kg", 1, 0)], 0, 0);
        assert!(matches!(d.validate(), Err(ValidationError::OutOfRange { .. })));
        assert_eq!(
            create_invoice(d, "inv-2", TransactionId::new(2), Utc::now()).unwrap_err().field(),
            "unitPrice"
        );
    }

    #[test]
    fn test_total_overflow_is_rejected() {
        // every line is within bounds, but ten of them overflow the total
        let lines = (0..10)
            .map(|n| line(&format!("Gold {n}"), 1_000_000, 10_000_000_000))
            .collect();
        let d = draft(lines, 0, 0);

        assert_eq!(d.validate().unwrap_err().field(), "totals.total");
        let err = create_invoice(d, "inv-3", TransactionId::new(3), Utc::now()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "totals.total"));

        let two = draft(
            vec![
                line("Gold 1", 1_000_000, 10_000_000_000),
                line("Gold 2", 1_000_000, 10_000_000_000),
            ],
            0,
            0,
        );
        let invoice = create_invoice(two, "inv-4", TransactionId::new(4), Utc::now()).unwrap();
        assert_eq!(invoice.totals().total, Money::from_poisha(2_000_000_000_000_000_000));
    }

    #[test]
    fn test_open_credit_without_due_date_is_valid() {
        let invoice = create_invoice(
            draft(vec![line("Rice", 3, 100)], 0, 0),
            "c",
            TransactionId::new(3),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(invoice.totals().due, Money::from_taka(300));
        assert!(invoice.due_date().is_none());
    }

    #[test]
    fn test_sequence_never_reissues() {
        let mut seq = TransactionIdSequence::new();
        assert_eq!(seq.last_issued(), None);
        let ids: Vec<_> = seq.by_ref().take(3).collect();
        assert_eq!(
            ids,
            vec![TransactionId::new(1), TransactionId::new(2), TransactionId::new(3)]
        );
        assert_eq!(seq.last_issued(), Some(TransactionId::new(3)));

        let mut resumed = TransactionIdSequence::starting_after(TransactionId::new(3));
        assert_eq!(resumed.next(), Some(TransactionId::new(4)));

        let mut full = TransactionIdSequence::starting_after(TransactionId::new(u64::MAX));
        assert_eq!(full.next(), None);
        assert_eq!(full.last_issued(), Some(TransactionId::new(u64::MAX)));
    }

    #[test]
    fn test_last_issued_tracks_next() {
        let mut seq = TransactionIdSequence::starting_after(TransactionId::new(u64::MAX - 5));
        assert_eq!(seq.next(), Some(TransactionId::new(u64::MAX - 4)));
        assert_eq!(seq.last_issued(), Some(TransactionId::new(u64::MAX - 4)));

        assert_eq!(seq.next(), Some(TransactionId::new(u64::MAX - 3)));
        assert_eq!(seq.last_issued(), Some(TransactionId::new(u64::MAX - 3)));
        assert_eq!(seq.last_issued(), Some(TransactionId::new(u64::MAX - 3)));

        let mut fresh = TransactionIdSequence::new();
        assert_eq!(fresh.next(), Some(TransactionId::new(1)));
        assert_eq!(fresh.last_issued(), Some(TransactionId::new(1)));
    }

    #[test]
    fn test_restore_round_trip() {
        let invoice = counter_sale(7).with_version(3);
        let restored = Invoice::restore(invoice.to_parts()).unwrap();
        assert_eq!(restored, invoice);

        let json = serde_json::to_string(&invoice.to_parts()).unwrap();
        let parts: InvoiceParts = serde_json::from_str(&json).unwrap();
        assert_eq!(Invoice::restore(parts).unwrap(), invoice);
    }

    #[test]
    fn test_restore_rejects_tampered_totals() {
        let invoice = counter_sale(8);

        let mut parts = invoice.to_parts();
        parts.totals.due = Money::zero();
        assert!(matches!(
            Invoice::restore(parts).unwrap_err(),
            ValidationError::Inconsistent { .. }
        ));

        let mut parts = invoice.to_parts();
        parts.totals.total = Money::from_taka(999);
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "totals.total");

        // paid and due shifted together still disagree with initial_paid
        let mut parts = invoice.to_parts();
        parts.totals.paid = Money::from_taka(130);
        parts.totals.due = Money::from_taka(100);
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "totals.paid");

        let mut parts = invoice.to_parts();
        parts.items.clear();
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "items");
    }

    #[test]
    fn test_created_totals_are_consistent() {
        proptest!(|(
            lines in prop::collection::vec((1i64..50, 0i64..100_000), 1..8),
            discount in 0i64..2_000_000,
            paid in -1_000i64..2_000_000,
        )| {
            let items = lines
                .iter()
                .map(|(qty, price)| LineItemDraft {
                    product_name: "Item".to_string(),
                    quantity: *qty,
                    unit_price: Money::from_poisha(*price),
                })
                .collect();
            let d = InvoiceDraft {
                discount: Money::from_poisha(discount),
                initial_paid: Money::from_poisha(paid),
                ..draft(items, 0, 0)
            };
            let invoice = create_invoice(d, "p", TransactionId::new(1), Utc::now()).unwrap();
            let t = invoice.totals();

            let expected: i64 = lines.iter().map(|(q, p)| q * p).sum();
            prop_assert_eq!(t.total.poisha(), expected);
            prop_assert!(t.is_consistent());
            prop_assert!(!t.due.is_negative());
            prop_assert_eq!(t.due, t.payable.sub_clamped(t.paid));
        });
    }
}
