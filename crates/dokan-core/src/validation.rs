//! # Validation Module
//!
//! Input validation for catalog entries, sale input and store settings.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard forms (TypeScript)                                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Boundary parsing                                             │
//! │  ├── Text → Money via `str::parse::<Money>()` / `parse_amount`         │
//! │  └── THIS MODULE: Business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (SQLite CHECK / UNIQUE constraints)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use dokan_core::validation::{validate_product_code, validate_line_quantity};
//!
//! assert!(validate_product_code("1002").is_ok());
//! assert!(validate_line_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Customer, Product, StoreSettings, TaxRate};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CODE_LEN: usize = 50;
const MAX_NAME_LEN: usize = 200;
const MAX_PHONE_LEN: usize = 20;
const MAX_SEARCH_LEN: usize = 100;

/// Largest quantity accepted on a single sale line.
pub const MAX_LINE_QUANTITY: i64 = 1_000_000;

/// Largest single amount accepted as a price, discount or payment
/// (৳10,000,000,000). Keeps `MAX_LINE_QUANTITY × MAX_AMOUNT` inside `i64`.
pub const MAX_AMOUNT: Money = Money::from_taka(10_000_000_000);

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_product_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a non-empty name of at most 200 characters.
///
/// ## Example
/// ```rust
/// use dokan_core::validation::validate_name;
///
/// assert!(validate_name("name", "Miniket Rice 5kg").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a phone number: digits with an optional leading `+`,
/// spaces and hyphens allowed as separators. Empty is allowed (walk-in).
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Ok(());
    }

    if phone.len() > MAX_PHONE_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_PHONE_LEN,
        });
    }

    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !digits
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
        || !digits.chars().any(|c| c.is_ascii_digit())
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must contain only digits".to_string(),
        });
    }

    Ok(())
}

/// Validates the shape of an email address (`local@domain.tld`).
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be an email address".to_string(),
        });
    }

    Ok(())
}

/// Validates a search query; returns it trimmed.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_SEARCH_LEN {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: MAX_SEARCH_LEN,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sold quantity: must be in `1..=MAX_LINE_QUANTITY`.
pub fn validate_line_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level or threshold: must be >= 0.
pub fn validate_stock_level(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::negative(field));
    }

    Ok(())
}

/// Validates that an amount is not negative. Zero is allowed (free items,
/// zero initial payment).
///
/// ## Example
/// ```rust
/// use dokan_core::money::Money;
/// use dokan_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("discount", Money::zero()).is_ok());
/// assert!(validate_non_negative("discount", Money::from_poisha(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::negative(field));
    }

    Ok(())
}

/// Validates an entered amount: not negative and at most [`MAX_AMOUNT`].
///
/// ## Example
/// ```rust
/// use dokan_core::money::Money;
/// use dokan_core::validation::{validate_amount, MAX_AMOUNT};
///
/// assert!(validate_amount("unitPrice", MAX_AMOUNT).is_ok());
/// assert!(validate_amount("unitPrice", MAX_AMOUNT + Money::from_poisha(1)).is_err());
/// ```
pub fn validate_amount(field: &str, amount: Money) -> ValidationResult<()> {
    validate_non_negative(field, amount)?;

    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT.poisha(),
        });
    }

    Ok(())
}

/// Parses a form amount and rejects negatives, reporting errors against `field`.
pub fn parse_amount(field: &str, input: &str) -> ValidationResult<Money> {
    let amount: Money = input.parse().map_err(|err| match err {
        ValidationError::Required { .. } => ValidationError::Required {
            field: field.to_string(),
        },
        ValidationError::InvalidFormat { reason, .. } => ValidationError::InvalidFormat {
            field: field.to_string(),
            reason,
        },
        other => other,
    })?;
    validate_amount(field, amount)?;
    Ok(amount)
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate(field: &str, rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a catalog entry before it is stored.
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_code(&product.code)?;
    validate_name("name", &product.name)?;
    validate_amount("purchasePrice", product.purchase_price)?;
    validate_amount("retailPrice", product.retail_price)?;
    validate_amount("wholesalePrice", product.wholesale_price)?;
    validate_stock_level("quantity", product.quantity)?;
    validate_stock_level("alertQuantity", product.alert_quantity)?;
    validate_tax_rate("tax", product.tax_rate)?;
    Ok(())
}

/// Validates the customer on a sale. Phone may be empty for walk-ins.
pub fn validate_customer(customer: &Customer) -> ValidationResult<()> {
    validate_name("customer.name", &customer.name)?;
    validate_phone("customer.phone", &customer.phone)?;
    Ok(())
}

/// Validates the store profile form.
pub fn validate_store_settings(settings: &StoreSettings) -> ValidationResult<()> {
    validate_name("storeName", &settings.store_name)?;
    validate_phone("phone", &settings.phone)?;
    validate_email("email", &settings.email)?;
    validate_tax_rate("taxRate", settings.tax_rate)?;

    let currency = settings.currency.trim();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a three-letter ISO code".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
