//! # Error Types
//!
//! Domain-specific error types for dokan-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  dokan-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors (not found, stock)       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  dokan-core ledger                                                     │
//! │  └── LedgerError      - CoreError or a collaborator (store) failure    │
//! │                                                                         │
//! │  dokan-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError → Presentation        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Every validation failure names the offending field
//! 3. Errors are enum variants, never String
//! 4. A rejected operation never leaves a half-updated value behind

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced invoice or product does not exist.
    ///
    /// ## When This Occurs
    /// - Invoice id/transaction id unknown to the store
    /// - Product code unknown (or soft-deleted) when recording a sale
    ///
    /// The operation fails as a whole; nothing falls back to a default value.
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    /// Insufficient stock to complete a sale.
    ///
    /// ## User Workflow
    /// ```text
    /// Sale line (code: 1002, qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { code: "1002", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {code}: available {available}, requested {requested}")]
    InsufficientStock {
        code: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and key.
    pub fn not_found(entity: impl Into<String>, key: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            key: key.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Each variant carries the field that failed so the presentation layer can
/// attach the message to the right form input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Value must be strictly greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be below zero.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., unparsable amount, bad email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that must hold at least one element is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },

    /// A payment was attempted against an invoice with nothing left to pay.
    #[error("invoice #{transaction_id} has no outstanding due")]
    NothingDue { transaction_id: u64 },

    /// Stored figures do not reconcile (e.g., loaded invoice with paid ≠ Σ payments).
    #[error("{field} is inconsistent: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// Returns the name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Empty { field }
            | ValidationError::Inconsistent { field, .. } => field,
            ValidationError::NothingDue { .. } => "totals.due",
        }
    }

    pub(crate) fn negative(field: &str) -> Self {
        ValidationError::Negative {
            field: field.to_string(),
        }
    }

    pub(crate) fn inconsistent(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Inconsistent {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            code: "1002".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 1002: available 3, requested 5"
        );

        let err = CoreError::not_found("Invoice", "42");
        assert_eq!(err.to_string(), "Invoice not found: 42");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "customer.name".to_string(),
        };
        assert_eq!(err.to_string(), "customer.name is required");

        let err = ValidationError::NothingDue { transaction_id: 7 };
        assert_eq!(err.to_string(), "invoice #7 has no outstanding due");
    }

    #[test]
    fn test_validation_error_field() {
        assert_eq!(ValidationError::negative("discount").field(), "discount");
        assert_eq!(
            ValidationError::NothingDue { transaction_id: 1 }.field(),
            "totals.due"
        );
        let err = ValidationError::Empty {
            field: "items".to_string(),
        };
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "code".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
