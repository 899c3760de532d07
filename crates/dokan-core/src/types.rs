//! # Domain Types
//!
//! Catalog and reference types shared by invoices, alerts and reports.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   SaleSystem    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  Retail         │   │  Cash           │       │
//! │  │  code (lookup)  │   │  Wholesale      │   │  Card           │       │
//! │  │  3 prices       │   └─────────────────┘   │  MobileBanking  │       │
//! │  │  quantity       │                         │  BankTransfer   │       │
//! │  │  alert_quantity │   ┌─────────────────┐   └─────────────────┘       │
//! │  └─────────────────┘   │    TaxRate      │                              │
//! │                        │  bps (u32)      │   ┌─────────────────┐       │
//! │  ┌─────────────────┐   │  750 = 7.5%     │   │  StoreSettings  │       │
//! │  │    Customer     │   └─────────────────┘   │  report header  │       │
//! │  │  name, phone    │                         └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! - `id`: UUID v4 - immutable, used for storage relations
//! - `code`: human-facing product code typed or scanned at the counter

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 750 bps = 7.5% (e.g., reduced VAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Whether a product's price already includes its tax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum TaxType {
    /// Price includes tax; the tax is carved out of it.
    Inclusive,
    /// Tax is charged on top of the price.
    #[default]
    Exclusive,
}

// =============================================================================
// Sale System / Payment Method
// =============================================================================

/// Sales channel: decides which price list applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleSystem {
    Retail,
    Wholesale,
}

impl SaleSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleSystem::Retail => "retail",
            SaleSystem::Wholesale => "wholesale",
        }
    }
}

impl fmt::Display for SaleSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// bKash/Nagad style wallet transfer.
    MobileBanking,
    BankTransfer,
}

// =============================================================================
// Product
// =============================================================================

/// Unit of measure a product is sold in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum Unit {
    #[serde(rename = "pcs")]
    Piece,
    #[serde(rename = "kg")]
    Weight,
    #[serde(rename = "ltr")]
    Volume,
}

/// A product in the catalog.
///
/// ## Invariants
/// `quantity` and `alert_quantity` are never negative; see
/// [`crate::validation::validate_product`]. Products are soft-deleted
/// (`is_active = false`) because invoices keep referring to them by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display/lookup code, unique across the catalog.
    pub code: String,

    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub brand: String,
    pub unit: Unit,

    pub purchase_price: Money,
    pub retail_price: Money,
    pub wholesale_price: Money,

    /// Current stock on hand.
    pub quantity: i64,

    /// Stock level at or below which the product is flagged.
    pub alert_quantity: i64,

    pub tax_rate: TaxRate,
    pub tax_type: TaxType,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price for the given sales channel.
    pub fn unit_price(&self, sale_system: SaleSystem) -> Money {
        match sale_system {
            SaleSystem::Retail => self.retail_price,
            SaleSystem::Wholesale => self.wholesale_price,
        }
    }

    /// Tax portion for `quantity` units sold under `sale_system`.
    ///
    /// Inclusive products carve the tax out of the price; exclusive ones add
    /// it on top.
    pub fn tax_on(&self, sale_system: SaleSystem, quantity: i64) -> Money {
        if self.tax_rate.is_zero() {
            return Money::zero();
        }
        let line = self.unit_price(sale_system).multiply_quantity(quantity);
        match self.tax_type {
            TaxType::Inclusive => line.included_tax(self.tax_rate),
            TaxType::Exclusive => line.calculate_tax(self.tax_rate),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub phone: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Customer {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

// =============================================================================
// Store Settings
// =============================================================================

/// Store profile shown in report and invoice headers.
///
/// A single record per installation; validated by
/// [`crate::validation::validate_store_settings`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    pub store_name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub email: String,
    pub tax_rate: TaxRate,
    /// ISO 4217 code, e.g. "BDT".
    pub currency: String,
    pub logo_url: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
