//! # Stock Alerts
//!
//! Low-stock evaluation and availability checks.
//!
//! The dashboard's notification bell polls on its own timer and calls
//! [`low_stock_summary`]; nothing in here schedules or caches anything.
//!
//! ```text
//! quantity <= alert_quantity  ──►  low stock
//!
//!   code  qty  alert
//!   1001   12     5   ok
//!   1002    5     5   LOW  (at threshold counts)
//!   1003    0     2   LOW
//! ```

use serde::Serialize;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::types::Product;
use crate::validation::validate_line_quantity;

/// Whether a product is at or below its alert threshold.
#[inline]
pub fn is_low_stock(product: &Product) -> bool {
    product.quantity <= product.alert_quantity
}

/// Products at or below their threshold, in input order.
pub fn list_low_stock(products: &[Product]) -> Vec<&Product> {
    products.iter().filter(|p| is_low_stock(p)).collect()
}

/// Count plus list for the notification feed.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LowStockSummary {
    pub count: usize,
    pub items: Vec<Product>,
}

pub fn low_stock_summary(products: &[Product]) -> LowStockSummary {
    let items: Vec<Product> = list_low_stock(products).into_iter().cloned().collect();
    LowStockSummary {
        count: items.len(),
        items,
    }
}

/// Fails when selling `requested` units would take stock below zero.
///
/// ## Example
/// ```rust
/// # use dokan_core::stock::check_availability;
/// # fn demo(product: &dokan_core::types::Product) {
/// if let Err(err) = check_availability(product, 5) {
///     eprintln!("{err}");
/// }
/// # }
/// ```
pub fn check_availability(product: &Product, requested: i64) -> CoreResult<()> {
    validate_line_quantity(requested)?;

    if requested > product.quantity {
        return Err(CoreError::InsufficientStock {
            code: product.code.clone(),
            available: product.quantity,
            requested,
        });
    }

    Ok(())
}
