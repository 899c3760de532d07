//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A due balance computed that way can end up at -0.0000001 and show      │
//! │  as "due" forever.                                                      │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Poisha (1 taka = 100 poisha)                     │
//! │    ৳230 - ৳100 - ৳130 = 0 poisha, exactly                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dokan_core::money::Money;
//!
//! let price = Money::from_taka(100);       // ৳100.00
//! let line = price.multiply_quantity(2);   // ৳200.00
//! let due = line.sub_clamped(Money::from_taka(250));
//! assert!(due.is_zero());                  // never negative
//!
//! // Form input is parsed once, at the boundary
//! let paid: Money = "130.50".parse().unwrap();
//! assert_eq!(paid.poisha(), 13050);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::TaxRate;

/// Poisha per taka.
const SUBUNITS: i64 = 100;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in poisha (1/100 of a taka).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences may go negative before being
///   clamped; stored invoice figures never are
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money is Used
/// ```text
/// Product.retail_price ──┬──► LineItem.unit_price ──► LineItem.line_total
///                        │
///                        └──► Displayed as "৳100.00" in the dashboard
///
/// Σ line_total ──► Totals.total ──► payable ──► paid / due ──► PaymentRecord
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from poisha (the smallest currency unit).
    #[inline]
    pub const fn from_poisha(poisha: i64) -> Self {
        Money(poisha)
    }

    /// Creates a Money value from whole taka.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// assert_eq!(Money::from_taka(250).poisha(), 25_000);
    /// ```
    #[inline]
    pub const fn from_taka(taka: i64) -> Self {
        Money(taka * SUBUNITS)
    }

    /// Returns the value in poisha.
    #[inline]
    pub const fn poisha(&self) -> i64 {
        self.0
    }

    /// Returns the whole-taka portion (truncated toward zero).
    #[inline]
    pub const fn taka(&self) -> i64 {
        self.0 / SUBUNITS
    }

    /// Returns the poisha portion (always 0-99).
    #[inline]
    pub const fn poisha_part(&self) -> i64 {
        (self.0 % SUBUNITS).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// assert_eq!(Money::from_poisha(-70).clamp_non_negative(), Money::zero());
    /// assert_eq!(Money::from_poisha(70).clamp_non_negative().poisha(), 70);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Subtracts and floors the result at zero: `max(self - other, 0)`.
    ///
    /// This is the due-balance rule used throughout the ledger.
    #[inline]
    pub const fn sub_clamped(self, other: Money) -> Self {
        Money(self.0 - other.0).clamp_non_negative()
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Self {
        Ord::min(self, other)
    }

    /// Multiplies money by a quantity, saturating at the numeric bounds.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// let unit_price = Money::from_taka(100);
    /// assert_eq!(unit_price.multiply_quantity(2), Money::from_taka(200));
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// assert_eq!(Money::from_taka(5).checked_multiply_quantity(3), Some(Money::from_taka(15)));
    /// assert_eq!(Money::from_poisha(i64::MAX).checked_multiply_quantity(2), None);
    /// ```
    #[inline]
    pub const fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        match self.0.checked_mul(qty) {
            Some(poisha) => Some(Money(poisha)),
            None => None,
        }
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub const fn checked_add(self, other: Money) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(poisha) => Some(Money(poisha)),
            None => None,
        }
    }

    /// Adds two amounts, saturating at the numeric bounds.
    #[inline]
    pub const fn saturating_add(self, other: Money) -> Self {
        Money(self.0.saturating_add(other.0))
    }

    /// Sums amounts, returning `None` if the running total overflows.
    pub fn checked_sum(amounts: impl IntoIterator<Item = Money>) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Calculates tax on top of this amount (exclusive tax).
    ///
    /// Uses integer math `(amount * bps + 5000) / 10000`, which rounds half up.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    /// use dokan_core::types::TaxRate;
    ///
    /// let price = Money::from_taka(10);       // ৳10.00
    /// let rate = TaxRate::from_bps(750);      // 7.5%
    /// assert_eq!(price.calculate_tax(rate).poisha(), 75);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        // i128 keeps large wholesale amounts from overflowing
        let tax = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_poisha(tax as i64)
    }

    /// Returns the tax portion already contained in a tax-inclusive amount.
    ///
    /// `tax = amount × bps / (10000 + bps)`, rounded half up.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    /// use dokan_core::types::TaxRate;
    ///
    /// let gross = Money::from_taka(115);       // ৳115 incl. 15%
    /// let tax = gross.included_tax(TaxRate::from_bps(1500));
    /// assert_eq!(tax, Money::from_taka(15));
    /// ```
    pub fn included_tax(&self, rate: TaxRate) -> Money {
        let divisor = 10000_i128 + rate.bps() as i128;
        let tax = (2 * self.0 as i128 * rate.bps() as i128 + divisor) / (2 * divisor);
        Money::from_poisha(tax as i64)
    }

    /// Rounds to the nearest whole taka, half away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use dokan_core::money::Money;
    ///
    /// assert_eq!(Money::from_poisha(12_350).round_to_taka(), Money::from_taka(124));
    /// assert_eq!(Money::from_poisha(12_349).round_to_taka(), Money::from_taka(123));
    /// ```
    pub fn round_to_taka(&self) -> Money {
        let half = SUBUNITS / 2;
        let adjusted = if self.0 < 0 { self.0 - half } else { self.0 + half };
        Money((adjusted / SUBUNITS) * SUBUNITS)
    }
}

// =============================================================================
// Parsing (form input boundary)
// =============================================================================

/// Parses a decimal amount such as `"130"`, `"130.5"` or `"-2.25"`.
///
/// ## Rules
/// - Leading/trailing whitespace is ignored
/// - At most one decimal point; digits only otherwise
/// - More than two fraction digits round half away from zero (`"0.125"` → 13 poisha)
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Required {
                field: "amount".to_string(),
            });
        }

        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        let (whole, fraction) = match digits.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (digits, ""),
        };

        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid("no digits"));
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number"));
        }

        let whole_value: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid("amount too large"))?
        };

        let mut fraction_digits = fraction.bytes().map(|b| (b - b'0') as i64);
        let tenths = fraction_digits.next().unwrap_or(0);
        let hundredths = fraction_digits.next().unwrap_or(0);
        let round_up = fraction_digits.next().is_some_and(|d| d >= 5);

        let magnitude = whole_value
            .checked_mul(SUBUNITS)
            .and_then(|p| p.checked_add(tenths * 10 + hundredths + i64::from(round_up)))
            .ok_or_else(|| invalid("amount too large"))?;

        Ok(Money(if negative { -magnitude } else { magnitude }))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with the taka sign, e.g. `৳1250.50`.
///
/// ## Note
/// Dashboard pages do their own localized formatting; this is for logs.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}৳{}.{:02}", sign, self.taka().abs(), self.poisha_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_taka_and_parts() {
        let money = Money::from_poisha(125_050);
        assert_eq!(money.taka(), 1250);
        assert_eq!(money.poisha_part(), 50);
        assert_eq!(Money::from_taka(3).poisha(), 300);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_poisha(1099).to_string(), "৳10.99");
        assert_eq!(Money::from_taka(130).to_string(), "৳130.00");
        assert_eq!(Money::from_poisha(-550).to_string(), "-৳5.50");
        assert_eq!(Money::zero().to_string(), "৳0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_taka(200);
        let b = Money::from_taka(50);
        assert_eq!(a + b, Money::from_taka(250));
        assert_eq!(a - b, Money::from_taka(150));
        assert_eq!(b * 3, Money::from_taka(150));

        let total: Money = [a, b].iter().sum();
        assert_eq!(total, Money::from_taka(250));
        let empty: Money = Vec::<Money>::new().into_iter().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_overflow_is_detected() {
        let big = Money::from_poisha(i64::MAX);
        assert_eq!(big.checked_add(Money::from_poisha(1)), None);
        assert_eq!(big.saturating_add(Money::from_poisha(1)), big);
        assert_eq!(big.multiply_quantity(2), big);
        assert_eq!(
            Money::from_taka(1_000_000).checked_multiply_quantity(200_000_000_000),
            None
        );

        assert_eq!(
            Money::checked_sum([Money::from_taka(2), Money::from_taka(3)]),
            Some(Money::from_taka(5))
        );
        assert_eq!(Money::checked_sum([big, Money::from_poisha(1)]), None);
        assert_eq!(Money::checked_sum([]), Some(Money::zero()));
    }

    #[test]
    fn test_clamping() {
        let due = Money::from_taka(130);
        assert_eq!(due.sub_clamped(Money::from_taka(200)), Money::zero());
        assert_eq!(due.sub_clamped(Money::from_taka(30)), Money::from_taka(100));
        assert_eq!(Money::from_poisha(-1).clamp_non_negative(), Money::zero());
        assert_eq!(due.min(Money::from_taka(20)), Money::from_taka(20));
    }

    #[test]
    fn test_tax() {
        let amount = Money::from_taka(10);
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(1000)).poisha(), 100);
        // ৳10.00 at 8.25% = 82.5 poisha → 83 (half up)
        assert_eq!(amount.calculate_tax(TaxRate::from_bps(825)).poisha(), 83);
        assert!(amount.calculate_tax(TaxRate::zero()).is_zero());

        let gross = Money::from_taka(105);
        assert_eq!(gross.included_tax(TaxRate::from_bps(500)), Money::from_taka(5));
        assert!(gross.included_tax(TaxRate::zero()).is_zero());
    }

    #[test]
    fn test_round_to_taka() {
        assert_eq!(Money::from_poisha(150).round_to_taka(), Money::from_taka(2));
        assert_eq!(Money::from_poisha(149).round_to_taka(), Money::from_taka(1));
        assert_eq!(Money::from_poisha(-150).round_to_taka(), Money::from_taka(-2));
        assert_eq!(Money::from_taka(7).round_to_taka(), Money::from_taka(7));
    }

    #[test]
    fn test_parse() {
        assert_eq!("130".parse::<Money>().unwrap(), Money::from_taka(130));
        assert_eq!(" 130.5 ".parse::<Money>().unwrap().poisha(), 13050);
        assert_eq!("0.07".parse::<Money>().unwrap().poisha(), 7);
        assert_eq!(".5".parse::<Money>().unwrap().poisha(), 50);
        assert_eq!("-2.25".parse::<Money>().unwrap().poisha(), -225);
        assert_eq!("0.125".parse::<Money>().unwrap().poisha(), 13);
        assert_eq!("0.1249".parse::<Money>().unwrap().poisha(), 12);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "".parse::<Money>(),
            Err(ValidationError::Required { .. })
        ));
        for bad in ["abc", "1.2.3", "12a", "-", ".", "1,000", "99999999999999999999"] {
            let err = bad.parse::<Money>().unwrap_err();
            assert_eq!(err.field(), "amount", "input {bad:?}");
        }
    }
}
