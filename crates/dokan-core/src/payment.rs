//! # Payment Ledger
//!
//! Applies installments against an invoice's due balance.
//!
//! ## Applying a Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     apply_payment (due = ৳130)                          │
//! │                                                                         │
//! │  request: amount ৳200, discount ৳0                                      │
//! │      │                                                                  │
//! │      ├── due <= 0?            → ValidationError::NothingDue             │
//! │      ├── amount/discount < 0? → ValidationError::Negative               │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  discount applied = min(discount, due)          = ৳0                    │
//! │  paid applied     = min(amount, due - discount) = ৳130                  │
//! │  absorbed         = amount - paid applied       = ৳70  (no change given)│
//! │  next due         = due - discount - paid       = ৳0                    │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  NEW Invoice value with one PaymentRecord appended                      │
//! │  (the input invoice is never touched)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persisting the returned invoice is the caller's job; concurrent payments
//! against one invoice are serialized by the store's version check.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::invoice::{Invoice, TransactionId};
use crate::money::Money;
use crate::types::Customer;
use crate::validation::{validate_amount, ValidationResult};

// =============================================================================
// Records
// =============================================================================

/// One installment. Immutable once appended to an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    /// Additional discount granted with this installment.
    pub discount: Money,
    /// Amount applied against the due balance.
    pub paid: Money,
    /// Tendered beyond the due balance and absorbed without change.
    pub absorbed: Money,
    /// Due balance left after this installment.
    pub next_due_amount: Money,
    #[ts(as = "Option<String>")]
    pub next_due_date: Option<NaiveDate>,
}

impl PaymentRecord {
    /// Amount the customer actually handed over.
    pub fn tendered(&self) -> Money {
        self.paid.saturating_add(self.absorbed)
    }

    /// Name of the first field that differs from `other`, if any.
    fn first_difference(&self, other: &PaymentRecord) -> Option<&'static str> {
        if self.payment_date != other.payment_date {
            Some("paymentDetails.paymentDate")
        } else if self.discount != other.discount {
            Some("paymentDetails.discount")
        } else if self.paid != other.paid {
            Some("paymentDetails.paid")
        } else if self.absorbed != other.absorbed {
            Some("paymentDetails.absorbed")
        } else if self.next_due_amount != other.next_due_amount {
            Some("paymentDetails.nextDueAmount")
        } else if self.next_due_date != other.next_due_date {
            Some("paymentDetails.nextDueDate")
        } else {
            None
        }
    }
}

/// An installment as entered on the payment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[ts(as = "String")]
    pub payment_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub discount: Money,
    #[ts(as = "Option<String>")]
    #[serde(default)]
    pub next_due_date: Option<NaiveDate>,
}

impl PaymentRequest {
    pub fn new(payment_date: NaiveDate, amount: Money) -> Self {
        PaymentRequest {
            payment_date,
            amount,
            discount: Money::zero(),
            next_due_date: None,
        }
    }

    pub fn with_discount(mut self, discount: Money) -> Self {
        self.discount = discount;
        self
    }

    pub fn next_due_on(mut self, date: NaiveDate) -> Self {
        self.next_due_date = Some(date);
        self
    }
}

// =============================================================================
// Applying Payments
// =============================================================================

impl Invoice {
    /// Applies an installment and returns the updated invoice.
    ///
    /// ## Errors
    /// - [`ValidationError::NothingDue`] when the invoice is already settled
    /// - [`ValidationError::Negative`] for a negative amount or discount
    /// - [`ValidationError::OutOfRange`] for an amount or discount above
    ///   [`MAX_AMOUNT`](crate::validation::MAX_AMOUNT)
    ///
    /// On error `self` is unchanged; on success `self` is unchanged too and
    /// the new state is the returned value.
    ///
    /// ## Example
    /// ```rust
    /// # use chrono::{NaiveDate, Utc};
    /// # use dokan_core::invoice::{create_invoice, InvoiceDraft, LineItemDraft, TransactionId};
    /// # use dokan_core::money::Money;
    /// # use dokan_core::payment::PaymentRequest;
    /// # use dokan_core::types::{Customer, PaymentMethod, SaleSystem};
    /// # let draft = InvoiceDraft {
    /// #     items: vec![LineItemDraft { product_name: "Sugar".into(), quantity: 1, unit_price: Money::from_taka(130) }],
    /// #     customer: Customer::new("Rina", ""),
    /// #     payment_method: PaymentMethod::Cash,
    /// #     sale_system: SaleSystem::Retail,
    /// #     discount: Money::zero(),
    /// #     initial_paid: Money::zero(),
    /// #     due_date: None,
    /// # };
    /// # let invoice = create_invoice(draft, "i", TransactionId::new(1), Utc::now()).unwrap();
    /// let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    /// let settled = invoice
    ///     .apply_payment(PaymentRequest::new(today, Money::from_taka(200)))
    ///     .unwrap();
    ///
    /// assert!(settled.is_paid());
    /// assert_eq!(settled.payment_details()[0].absorbed, Money::from_taka(70));
    /// ```
    pub fn apply_payment(&self, request: PaymentRequest) -> ValidationResult<Invoice> {
        let due = self.totals.due;
        if !due.is_positive() {
            return Err(ValidationError::NothingDue {
                transaction_id: self.transaction_id.value(),
            });
        }
        validate_amount("amount", request.amount)?;
        validate_amount("discount", request.discount)?;

        let discount = request.discount.min(due);
        let paid = request.amount.min(due - discount);
        let absorbed = request.amount - paid;
        let next_due_amount = (due - discount) - paid;
        let next_due_date = if next_due_amount.is_zero() {
            None
        } else {
            request.next_due_date
        };

        let mut updated = self.clone();
        updated.totals.discount += discount;
        updated.totals.payable -= discount;
        updated.totals.paid += paid;
        updated.totals.due = next_due_amount;
        updated.next_due_date = next_due_date;
        updated.payment_details.push(PaymentRecord {
            payment_date: request.payment_date,
            discount,
            paid,
            absorbed,
            next_due_amount,
            next_due_date,
        });

        Ok(updated)
    }

    /// Re-applies a stored installment; the record it produces must equal
    /// `record` field for field.
    pub(crate) fn replay(&self, record: &PaymentRecord) -> ValidationResult<Invoice> {
        let request = PaymentRequest {
            payment_date: record.payment_date,
            amount: record.tendered(),
            discount: record.discount,
            next_due_date: record.next_due_date,
        };
        let replayed = self.apply_payment(request).map_err(|err| match err {
            ValidationError::NothingDue { .. } => ValidationError::inconsistent(
                "paymentDetails",
                "installment recorded after the invoice was settled",
            ),
            other => ValidationError::inconsistent("paymentDetails", other.to_string()),
        })?;

        let applied = replayed.payment_details.last();
        if let Some(field) = applied.and_then(|applied| applied.first_difference(record)) {
            return Err(ValidationError::inconsistent(
                field,
                format!(
                    "installment of {} does not follow from a due of {}",
                    record.tendered(),
                    self.totals.due
                ),
            ));
        }

        Ok(replayed)
    }
}

// =============================================================================
// History View
// =============================================================================

/// Installment history for the payment-details screen.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentHistory {
    pub transaction_id: TransactionId,
    pub customer: Customer,
    pub payment_details: Vec<PaymentRecord>,
}

impl From<&Invoice> for PaymentHistory {
    fn from(invoice: &Invoice) -> Self {
        PaymentHistory {
            transaction_id: invoice.transaction_id(),
            customer: invoice.customer().clone(),
            payment_details: invoice.payment_details().to_vec(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{counter_sale, draft, line};
    use crate::invoice::{create_invoice, Invoice};
    use chrono::Utc;
    use proptest::prelude::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn pay(invoice: &Invoice, taka: i64) -> Invoice {
        invoice
            .apply_payment(PaymentRequest::new(day(2), Money::from_taka(taka)))
            .unwrap()
    }

    #[test]
    fn test_settling_the_counter_sale() {
        let invoice = counter_sale(1);
        let settled = pay(&invoice, 130);

        assert_eq!(settled.totals().due, Money::zero());
        assert_eq!(settled.totals().paid, Money::from_taka(230));
        assert_eq!(settled.payment_details().len(), 1);
        assert_eq!(settled.payment_details()[0].next_due_amount, Money::zero());
        assert_eq!(settled.payment_details()[0].absorbed, Money::zero());

        // input untouched
        assert_eq!(invoice.totals().due, Money::from_taka(130));
        assert!(invoice.payment_details().is_empty());
    }

    #[test]
    fn test_overpayment_is_absorbed() {
        let settled = pay(&counter_sale(1), 200);
        let record = &settled.payment_details()[0];

        assert_eq!(settled.totals().due, Money::zero());
        assert_eq!(settled.totals().paid, settled.totals().payable);
        assert_eq!(record.paid, Money::from_taka(130));
        assert_eq!(record.absorbed, Money::from_taka(70));
        assert_eq!(record.tendered(), Money::from_taka(200));
    }

    #[test]
    fn test_partial_payment_with_discount() {
        let invoice = counter_sale(1);
        let updated = invoice
            .apply_payment(
                PaymentRequest::new(day(5), Money::from_taka(50))
                    .with_discount(Money::from_taka(10))
                    .next_due_on(day(20)),
            )
            .unwrap();
        let t = updated.totals();

        assert_eq!(t.discount, Money::from_taka(30));
        assert_eq!(t.payable, Money::from_taka(220));
        assert_eq!(t.paid, Money::from_taka(150));
        assert_eq!(t.due, Money::from_taka(70));
        assert!(t.is_consistent());
        assert_eq!(updated.next_due_date(), Some(day(20)));
        assert_eq!(updated.payment_details()[0].next_due_amount, Money::from_taka(70));
    }

    #[test]
    fn test_discount_beyond_due_is_clamped() {
        let updated = counter_sale(1)
            .apply_payment(PaymentRequest::new(day(2), Money::zero()).with_discount(Money::from_taka(500)))
            .unwrap();
        assert_eq!(updated.totals().discount, Money::from_taka(150));
        assert_eq!(updated.totals().payable, Money::from_taka(100));
        assert!(updated.is_paid());
    }

    #[test]
    fn test_nothing_due_is_rejected() {
        let settled = pay(&counter_sale(9), 130);
        let before = settled.clone();

        let err = settled
            .apply_payment(PaymentRequest::new(day(3), Money::from_taka(1)))
            .unwrap_err();
        assert_eq!(err, ValidationError::NothingDue { transaction_id: 9 });
        assert_eq!(settled, before);
    }

    #[test]
    fn test_negative_inputs_are_rejected() {
        let invoice = counter_sale(1);
        let err = invoice
            .apply_payment(PaymentRequest::new(day(2), Money::from_taka(-1)))
            .unwrap_err();
        assert_eq!(err.field(), "amount");

        let err = invoice
            .apply_payment(PaymentRequest::new(day(2), Money::zero()).with_discount(Money::from_poisha(-1)))
            .unwrap_err();
        assert_eq!(err.field(), "discount");
    }

    #[test]
    fn test_history_survives_restore() {
        let invoice = pay(&counter_sale(4), 30);
        let invoice = pay(&invoice, 500);

        let restored = Invoice::restore(invoice.to_parts()).unwrap();
        assert_eq!(restored, invoice);

        let history = PaymentHistory::from(&restored);
        assert_eq!(history.transaction_id, TransactionId::new(4));
        assert_eq!(history.payment_details.len(), 2);

        let mut tampered = invoice.to_parts();
        tampered.payment_details[0].next_due_amount = Money::from_taka(1);
        assert_eq!(
            Invoice::restore(tampered).unwrap_err().field(),
            "paymentDetails.nextDueAmount"
        );
    }

    #[test]
    fn test_restore_replays_installments() {
        // an installment stored after the invoice was settled
        let settled = pay(&counter_sale(5), 130);
        let mut parts = settled.to_parts();
        parts.payment_details.push(PaymentRecord {
            payment_date: day(4),
            discount: Money::zero(),
            paid: Money::zero(),
            absorbed: Money::from_taka(5),
            next_due_amount: Money::zero(),
            next_due_date: None,
        });
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "paymentDetails");

        // a partial payment cannot absorb anything
        let partial = pay(&counter_sale(5), 30);
        let mut parts = partial.to_parts();
        parts.payment_details[0].absorbed = Money::from_taka(10);
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "paymentDetails.paid");

        // a settled installment carries no next due date
        let mut parts = settled.to_parts();
        parts.payment_details[0].next_due_date = Some(day(20));
        assert_eq!(
            Invoice::restore(parts).unwrap_err().field(),
            "paymentDetails.nextDueDate"
        );

        // the invoice's next due date follows the latest installment
        let promised = counter_sale(5)
            .apply_payment(PaymentRequest::new(day(2), Money::from_taka(30)).next_due_on(day(20)))
            .unwrap();
        assert_eq!(Invoice::restore(promised.to_parts()).unwrap(), promised);

        let mut parts = promised.to_parts();
        parts.next_due_date = Some(day(25));
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "nextDueDate");

        let mut parts = counter_sale(5).to_parts();
        parts.next_due_date = Some(day(25));
        assert_eq!(Invoice::restore(parts).unwrap_err().field(), "nextDueDate");
    }

    #[test]
    fn test_payments_accumulate() {
        proptest!(|(
            payable in 1i64..500_000,
            installments in prop::collection::vec((0i64..100_000, 0i64..20_000), 1..12),
        )| {
            let base = create_invoice(
                draft(vec![line("Item", 1, 0)], 0, 0),
                "p",
                TransactionId::new(1),
                Utc::now(),
            )
            .unwrap();
            let mut parts = base.to_parts();
            parts.items[0].unit_price = Money::from_poisha(payable);
            parts.totals.total = Money::from_poisha(payable);
            parts.totals.payable = Money::from_poisha(payable);
            parts.totals.due = Money::from_poisha(payable);
            let mut invoice = Invoice::restore(parts).unwrap();

            let mut tendered = 0i64;
            for (amount, discount) in &installments {
                if invoice.is_paid() {
                    break;
                }
                invoice = invoice
                    .apply_payment(
                        PaymentRequest::new(day(1), Money::from_poisha(*amount))
                            .with_discount(Money::from_poisha(*discount)),
                    )
                    .unwrap();
                tendered += amount + discount;

                let t = invoice.totals();
                prop_assert!(t.is_consistent());
                prop_assert!(t.paid <= t.payable);
            }

            let expected = (payable - tendered).max(0);
            prop_assert_eq!(invoice.totals().due.poisha(), expected);
            let restored = Invoice::restore(invoice.to_parts()).unwrap();
            prop_assert_eq!(restored, invoice);
        });
    }
}
