//! # Invoice Listing
//!
//! Search, status filtering and pagination for the transactions screen.
//!
//! ```text
//! all invoices ──► filter_invoices(query) ──► paginate(page, size) ──► Page
//!                  (search + status + channel)   (1-based pages)
//! ```
//!
//! Filtering always runs before pagination, so page counts describe the
//! filtered set.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::invoice::Invoice;
use crate::types::SaleSystem;
use crate::validation::{validate_search_query, ValidationResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    /// Fully settled invoices.
    Paid,
    /// Invoices with an outstanding balance.
    Due,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceQuery {
    /// Matched case-insensitively against transaction id, customer name and phone.
    pub search: String,
    pub status: StatusFilter,
    pub sale_system: Option<SaleSystem>,
}

impl InvoiceQuery {
    pub fn search(text: impl Into<String>) -> Self {
        InvoiceQuery {
            search: text.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_sale_system(mut self, sale_system: SaleSystem) -> Self {
        self.sale_system = Some(sale_system);
        self
    }

    /// Rejects search text longer than the search box allows.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_search_query(&self.search).map(|_| ())
    }

    pub fn matches(&self, invoice: &Invoice) -> bool {
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Paid => invoice.is_paid(),
            StatusFilter::Due => !invoice.is_paid(),
        };
        if !status_ok {
            return false;
        }

        if self
            .sale_system
            .is_some_and(|system| system != invoice.sale_system())
        {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let customer = invoice.customer();
        let haystack = format!(
            "{}{}{}",
            invoice.transaction_id(),
            customer.name,
            customer.phone
        )
        .to_lowercase();
        haystack.contains(&needle)
    }
}

/// Invoices matching `query`, in input order.
pub fn filter_invoices<'a>(invoices: &'a [Invoice], query: &InvoiceQuery) -> Vec<&'a Invoice> {
    invoices.iter().filter(|inv| query.matches(inv)).collect()
}

/// One page of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

/// Slices `items` into a 1-based page.
///
/// Page 0 is treated as page 1 and a page size of 0 as 1. A page past the
/// end has no items but still reports the totals.
///
/// ```rust
/// use dokan_core::listing::paginate;
///
/// let page = paginate((1..=25).collect::<Vec<_>>(), 3, 10);
/// assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
/// assert_eq!(page.total_pages, 3);
/// ```
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        page,
        page_size,
        total_items,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::tests::{counter_sale, draft, line};
    use crate::invoice::{create_invoice, TransactionId};
    use crate::money::Money;
    use crate::payment::PaymentRequest;
    use crate::types::Customer;
    use chrono::{NaiveDate, Utc};

    fn invoices() -> Vec<Invoice> {
        let settled = counter_sale(1)
            .apply_payment(PaymentRequest::new(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                Money::from_taka(130),
            ))
            .unwrap();

        let mut d = draft(vec![line("Flour", 10, 60)], 0, 0);
        d.customer = Customer::new("Mitali Store", "01819555555");
        d.sale_system = SaleSystem::Wholesale;
        let wholesale = create_invoice(d, "inv-2", TransactionId::new(2), Utc::now()).unwrap();

        vec![settled, wholesale, counter_sale(13)]
    }

    fn tids(list: &[&Invoice]) -> Vec<u64> {
        list.iter().map(|inv| inv.transaction_id().value()).collect()
    }

    #[test]
    fn test_status_filter() {
        let all = invoices();
        assert_eq!(tids(&filter_invoices(&all, &InvoiceQuery::default())), vec![1, 2, 13]);
        assert_eq!(
            tids(&filter_invoices(&all, &InvoiceQuery::default().with_status(StatusFilter::Paid))),
            vec![1]
        );
        assert_eq!(
            tids(&filter_invoices(&all, &InvoiceQuery::default().with_status(StatusFilter::Due))),
            vec![2, 13]
        );
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let all = invoices();
        assert_eq!(tids(&filter_invoices(&all, &InvoiceQuery::search("mitali"))), vec![2]);
        assert_eq!(tids(&filter_invoices(&all, &InvoiceQuery::search("  KARIM "))), vec![1, 13]);
        // transaction id is part of the haystack
        assert_eq!(tids(&filter_invoices(&all, &InvoiceQuery::search("13"))), vec![13]);
        assert_eq!(tids(&filter_invoices(&all, &InvoiceQuery::search("01819"))), vec![2]);
        assert!(filter_invoices(&all, &InvoiceQuery::search("nobody")).is_empty());
    }

    #[test]
    fn test_sale_system_filter() {
        let all = invoices();
        let query = InvoiceQuery::default().with_sale_system(SaleSystem::Retail);
        assert_eq!(tids(&filter_invoices(&all, &query)), vec![1, 13]);
    }

    #[test]
    fn test_paginate() {
        let page = paginate((1..=25).collect::<Vec<u32>>(), 1, 10);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.total_items, 25);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next());
        assert!(!page.has_previous());

        let zero = paginate(vec![1, 2, 3], 0, 2);
        assert_eq!(zero.page, 1);
        assert_eq!(zero.items, vec![1, 2]);

        let past = paginate(vec![1, 2, 3], 9, 2);
        assert!(past.items.is_empty());
        assert_eq!(past.total_pages, 2);
        assert_eq!(past.total_items, 3);

        let empty = paginate(Vec::<u32>::new(), 1, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next());
    }

    #[test]
    fn test_filter_before_paginate() {
        let all = invoices();
        let due: Vec<Invoice> = filter_invoices(&all, &InvoiceQuery::default().with_status(StatusFilter::Due))
            .into_iter()
            .cloned()
            .collect();
        let page = paginate(due, 1, 1);
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].transaction_id().value(), 2);
    }
}
