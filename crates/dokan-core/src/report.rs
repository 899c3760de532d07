//! # Sales Report
//!
//! Groups the line items of invoices in a date range by product and sales
//! channel.
//!
//! ## Aggregation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  invoices ──► created_at.date() in [from, to]?  (inclusive, UTC date)  │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │  every line ──► key (product_name, sale_system)                         │
//! │                  │                                                      │
//! │                  ├── new key?  push row   (first-occurrence order)      │
//! │                  └── existing? add qty / line_total, push contributor   │
//! │                                                                         │
//! │  Rice 5kg · retail     qty 7   ৳700   [#1 Karim, #4 Rina]               │
//! │  Rice 5kg · wholesale  qty 20  ৳1800  [#2 Mitali Store]                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Amounts are line totals. Invoice-level discounts are not spread back over
//! lines, so the report total is gross sales, not collected money.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use ts_rs::TS;

use crate::invoice::{Invoice, TransactionId};
use crate::money::Money;
use crate::types::{PaymentMethod, SaleSystem, StoreSettings};

/// One invoice line's contribution to a report row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ContributingSale {
    pub transaction_id: TransactionId,
    pub customer_name: String,
    pub phone: String,
    pub quantity: i64,
    pub amount: Money,
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub sale_system: SaleSystem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub product_name: String,
    pub sale_system: SaleSystem,
    pub total_quantity: i64,
    pub total_amount: Money,
    pub customers: Vec<ContributingSale>,
}

/// Builds report rows for invoices sold between `from` and `to`, both
/// inclusive. Time of day is ignored. An empty range yields no rows.
pub fn build_report(invoices: &[Invoice], from: NaiveDate, to: NaiveDate) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = Vec::new();
    let mut index: HashMap<(String, SaleSystem), usize> = HashMap::new();

    let in_range = invoices.iter().filter(|invoice| {
        let date = invoice.sale_date();
        date >= from && date <= to
    });

    for invoice in in_range {
        let sale_system = invoice.sale_system();
        for item in invoice.items() {
            let contribution = ContributingSale {
                transaction_id: invoice.transaction_id(),
                customer_name: invoice.customer().name.clone(),
                phone: invoice.customer().phone.clone(),
                quantity: item.quantity(),
                amount: item.line_total(),
                date: invoice.sale_date(),
                payment_method: invoice.payment_method(),
                sale_system,
            };

            let key = (item.product_name().to_string(), sale_system);
            let slot = *index.entry(key).or_insert_with(|| {
                rows.push(ReportRow {
                    product_name: item.product_name().to_string(),
                    sale_system,
                    total_quantity: 0,
                    total_amount: Money::zero(),
                    customers: Vec::new(),
                });
                rows.len() - 1
            });

            let row = &mut rows[slot];
            row.total_quantity = row.total_quantity.saturating_add(contribution.quantity);
            row.total_amount = row.total_amount.saturating_add(contribution.amount);
            row.customers.push(contribution);
        }
    }

    rows
}

/// Footer total of a report. Saturates rather than wrapping.
pub fn report_total(rows: &[ReportRow]) -> Money {
    rows.iter()
        .fold(Money::zero(), |acc, row| acc.saturating_add(row.total_amount))
}

/// A report ready for the presentation layer, with the store header.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReportStatement {
    pub store: Option<StoreSettings>,
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub rows: Vec<ReportRow>,
    pub total_amount: Money,
}

impl ReportStatement {
    pub fn new(
        store: Option<StoreSettings>,
        from: NaiveDate,
        to: NaiveDate,
        rows: Vec<ReportRow>,
    ) -> Self {
        let total_amount = report_total(&rows);
        ReportStatement {
            store,
            from,
            to,
            rows,
            total_amount,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{draft, line};
    use crate::invoice::create_invoice;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn sale(
        tid: u64,
        day: u32,
        hour: u32,
        system: SaleSystem,
        items: Vec<crate::invoice::LineItemDraft>,
    ) -> Invoice {
        let mut d = draft(items, 0, 0);
        d.sale_system = system;
        let created_at = Utc.with_ymd_and_hms(2024, 5, day, hour, 30, 0).unwrap();
        create_invoice(d, format!("inv-{tid}"), TransactionId::new(tid), created_at).unwrap()
    }

    #[test]
    fn test_groups_by_product_and_sale_system() {
        let invoices = vec![
            sale(1, 2, 9, SaleSystem::Retail, vec![line("Rice", 2, 100), line("Salt", 1, 50)]),
            sale(2, 3, 12, SaleSystem::Wholesale, vec![line("Rice", 20, 90)]),
            sale(3, 4, 18, SaleSystem::Retail, vec![line("Rice", 5, 100)]),
        ];

        let rows = build_report(&invoices, date(1), date(31));
        let keys: Vec<(&str, SaleSystem)> = rows
            .iter()
            .map(|r| (r.product_name.as_str(), r.sale_system))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Rice", SaleSystem::Retail),
                ("Salt", SaleSystem::Retail),
                ("Rice", SaleSystem::Wholesale),
            ]
        );

        let rice = &rows[0];
        assert_eq!(rice.total_quantity, 7);
        assert_eq!(rice.total_amount, Money::from_taka(700));
        let tids: Vec<u64> = rice.customers.iter().map(|c| c.transaction_id.value()).collect();
        assert_eq!(tids, vec![1, 3]);
        assert_eq!(rows[2].total_amount, Money::from_taka(1800));
        assert_eq!(report_total(&rows), Money::from_taka(2550));
    }

    #[test]
    fn test_range_is_inclusive_and_ignores_time_of_day() {
        let invoices = vec![
            sale(1, 1, 23, SaleSystem::Retail, vec![line("Oil", 1, 200)]),
            sale(2, 2, 0, SaleSystem::Retail, vec![line("Oil", 1, 200)]),
            sale(3, 3, 23, SaleSystem::Retail, vec![line("Oil", 1, 200)]),
            sale(4, 4, 0, SaleSystem::Retail, vec![line("Oil", 1, 200)]),
        ];

        let rows = build_report(&invoices, date(2), date(3));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_quantity, 2);

        assert!(build_report(&invoices, date(10), date(20)).is_empty());
        assert!(build_report(&invoices, date(3), date(2)).is_empty());
    }

    #[test]
    fn test_same_customer_is_not_deduplicated() {
        let invoices = vec![
            sale(1, 2, 9, SaleSystem::Retail, vec![line("Tea", 1, 10), line("Tea", 2, 10)]),
        ];
        let rows = build_report(&invoices, date(1), date(2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customers.len(), 2);
        assert_eq!(rows[0].total_quantity, 3);
    }

    #[test]
    fn test_statement_totals() {
        let invoices = vec![sale(1, 2, 9, SaleSystem::Retail, vec![line("Tea", 3, 10)])];
        let statement =
            ReportStatement::new(None, date(1), date(2), build_report(&invoices, date(1), date(2)));
        assert_eq!(statement.total_amount, Money::from_taka(30));

        let empty = ReportStatement::new(None, date(1), date(2), Vec::new());
        assert_eq!(empty.total_amount, Money::zero());
    }

    #[test]
    fn test_huge_totals_saturate() {
        // each line is the largest the validators accept
        let invoices: Vec<Invoice> = (1..=10)
            .map(|tid| {
                sale(tid, 2, 9, SaleSystem::Wholesale, vec![line("Gold", 1_000_000, 10_000_000_000)])
            })
            .collect();

        let rows = build_report(&invoices, date(1), date(2));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].total_quantity, 10_000_000);
        assert_eq!(rows[0].total_amount, Money::from_poisha(i64::MAX));
        assert_eq!(report_total(&rows), Money::from_poisha(i64::MAX));
    }

    #[test]
    fn test_report_is_complete() {
        proptest!(|(
            sales in prop::collection::vec((1u32..=28, 0usize..3, 1i64..10, 0i64..500, any::<bool>()), 0..25),
            from in 1u32..=28,
            span in 0u32..10,
        )| {
            let names = ["Rice", "Oil", "Salt"];
            let invoices: Vec<Invoice> = sales
                .iter()
                .enumerate()
                .map(|(i, (day, name, qty, price, wholesale))| {
                    let system = if *wholesale { SaleSystem::Wholesale } else { SaleSystem::Retail };
                    sale(i as u64 + 1, *day, 12, system, vec![line(names[*name], *qty, *price)])
                })
                .collect();

            let to = (from + span).min(31);
            let rows = build_report(&invoices, date(from), date(to));

            let expected: Money = invoices
                .iter()
                .filter(|inv| inv.sale_date() >= date(from) && inv.sale_date() <= date(to))
                .flat_map(|inv| inv.items().iter().map(|item| item.line_total()))
                .sum();
            prop_assert_eq!(report_total(&rows), expected);

            for row in &rows {
                for c in &row.customers {
                    prop_assert!(c.date >= date(from) && c.date <= date(to));
                }
            }
        });
    }
}
