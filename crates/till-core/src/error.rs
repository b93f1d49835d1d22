//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → UI notification         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Calculators (units, pricing, amortization) do not return errors at all:
//! they log and fall back to zero or identity. Only the operations that
//! change stored state fail, and they fail with these types.

use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Soft-deleted products stay in history but cannot be sold.
    #[error("Product {0} is no longer sold")]
    ProductInactive(String),

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Credit sale not found: {0}")]
    CreditSaleNotFound(String),

    #[error("Installment not found: {0}")]
    InstallmentNotFound(String),

    /// Paid is terminal: an installment is paid exactly once.
    #[error("Installment {number} of credit sale {credit_sale_id} is already paid")]
    InstallmentAlreadyPaid {
        credit_sale_id: String,
        number: i64,
    },

    /// "Pay all" was requested but every installment is already paid.
    #[error("Credit sale {0} has no pending installments")]
    NothingToPay(String),

    /// A credit sale can only be deleted once it is fully paid.
    ///
    /// ## User Workflow
    /// ```text
    /// Delete credit sale
    ///      │
    ///      ▼
    /// Count pending + overdue installments: 2
    ///      │
    ///      ▼
    /// PendingInstallmentsRemain { count: 2 }
    ///      │
    ///      ▼
    /// UI shows: "2 pending installments remain"
    /// ```
    #[error("Cannot delete credit sale {credit_sale_id}: {count} pending installments remain")]
    PendingInstallmentsRemain { credit_sale_id: String, count: i64 },

    /// The installment configuration broke one or more rules.
    #[error("Invalid installment configuration: {}", join_violations(.0))]
    InvalidInstallmentConfig(Vec<ValidationError>),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

fn join_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Serializable so the UI can show every violation of a form at once.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

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
        let err = CoreError::PendingInstallmentsRemain {
            credit_sale_id: "cs-1".to_string(),
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "Cannot delete credit sale cs-1: 2 pending installments remain"
        );

        let err = CoreError::InstallmentAlreadyPaid {
            credit_sale_id: "cs-1".to_string(),
            number: 3,
        };
        assert_eq!(
            err.to_string(),
            "Installment 3 of credit sale cs-1 is already paid"
        );
    }

    #[test]
    fn test_invalid_config_lists_every_violation() {
        let err = CoreError::InvalidInstallmentConfig(vec![
            ValidationError::OutOfRange {
                field: "installment_count".to_string(),
                min: 1.0,
                max: 36.0,
            },
            ValidationError::OutOfRange {
                field: "interest_rate".to_string(),
                min: 0.0,
                max: 50.0,
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid installment configuration: installment_count must be between 1 and 36; \
             interest_rate must be between 0 and 50"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "customer".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }

    #[test]
    fn test_validation_error_serializes_with_kind_tag() {
        let err = ValidationError::Required {
            field: "customer".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "required");
        assert_eq!(json["field"], "customer");
    }
}
