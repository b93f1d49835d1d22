//! # Validation Module
//!
//! Input validation for catalog, customer and credit-sale forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                      │
//! │  └── Immediate feedback while typing                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Field validators: first violation, Result<(), ValidationError>    │
//! │  └── Installment config: EVERY violation, Vec<ValidationError>         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / CHECK constraints                             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use chrono::NaiveDate;
//! use till_core::installment::InstallmentConfig;
//! use till_core::validation::{validate_installment_config, validate_sku};
//!
//! validate_sku("RICE-1KG").unwrap();
//!
//! let start = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
//! let config = InstallmentConfig::new(37, 51.0, start);
//! assert_eq!(validate_installment_config(&config).len(), 2);
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::installment::{
    InstallmentConfig, MAX_INSTALLMENTS, MAX_INTEREST_RATE, MAX_PRINCIPAL_CENTS,
};
use crate::money::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

fn validate_name(field: &str, name: &str, max: usize) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if name.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a product name: required, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 200)
}

/// Validates a customer name: required, at most 120 characters.
pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    validate_name("customer name", name, 120)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sold quantity: finite and greater than zero.
///
/// Quantities are fractional (0.25 kg), so there is no integer cap.
pub fn validate_quantity(quantity: f64) -> ValidationResult<()> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a price or cost in cents. Zero is allowed (free items).
///
/// ```rust
/// use till_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0.0,
            max: i64::MAX as f64,
        });
    }

    Ok(())
}

/// Validates the amount financed by a credit sale: above zero and at most
/// [`MAX_PRINCIPAL_CENTS`].
pub fn validate_principal(principal: Money) -> ValidationResult<()> {
    if !principal.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "principal".to_string(),
        });
    }

    if principal.cents() > MAX_PRINCIPAL_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "principal".to_string(),
            min: 0.01,
            max: MAX_PRINCIPAL_CENTS as f64 / 100.0,
        });
    }

    Ok(())
}

/// Validates a discount percentage: 0 to 100.
pub fn validate_discount_pct(pct: f64) -> ValidationResult<()> {
    if !(0.0..=100.0).contains(&pct) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0.0,
            max: 100.0,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Installment Configuration
// =============================================================================

/// Checks an installment configuration and returns every violation.
///
/// ## Rules
/// - `installment_count` in [1, 36]
/// - `interest_rate_pct` in [0, 50]
/// - `current_installment` in [1, installment_count]
///
/// Values are never clamped here: the caller shows the list and the user
/// fixes the form.
pub fn validate_installment_config(config: &InstallmentConfig) -> Vec<ValidationError> {
    let mut violations = Vec::new();

    if config.installment_count < 1 || config.installment_count > MAX_INSTALLMENTS {
        violations.push(ValidationError::OutOfRange {
            field: "installment_count".to_string(),
            min: 1.0,
            max: MAX_INSTALLMENTS as f64,
        });
    }

    if !(0.0..=MAX_INTEREST_RATE).contains(&config.interest_rate_pct) {
        violations.push(ValidationError::OutOfRange {
            field: "interest_rate".to_string(),
            min: 0.0,
            max: MAX_INTEREST_RATE,
        });
    }

    if config.current_installment < 1 || config.current_installment > config.installment_count {
        violations.push(ValidationError::OutOfRange {
            field: "current_installment".to_string(),
            min: 1.0,
            max: config.installment_count as f64,
        });
    }

    violations
}

// =============================================================================
// Credit Customer
// =============================================================================

/// Who a credit sale is for.
///
/// Picking an existing customer and typing a new name are alternatives, so
/// selecting one replaces the other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CustomerSelection {
    /// An existing customer, by id.
    Existing(String),
    /// A customer to create with this name.
    New(String),
}

/// A credit sale needs a customer, existing or new.
pub fn validate_credit_customer(selection: Option<&CustomerSelection>) -> ValidationResult<()> {
    match selection {
        None => Err(ValidationError::Required {
            field: "customer".to_string(),
        }),
        Some(CustomerSelection::Existing(id)) if id.trim().is_empty() => {
            Err(ValidationError::Required {
                field: "customer".to_string(),
            })
        }
        Some(CustomerSelection::Existing(_)) => Ok(()),
        Some(CustomerSelection::New(name)) => validate_customer_name(name),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
