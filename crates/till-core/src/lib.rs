//! # till-core: Pure Business Logic for Till
//!
//! This crate is the **heart** of Till. It contains the shop's arithmetic
//! and rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI forms (sale, credit, cash)                │   │
//! │  │    quantity/unit ──► price, profit ──► installment preview      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌──────────────┐  ┌──────────┐ │   │
//! │  │   │   units   │  │  pricing  │  │ amortization │  │installment│ │   │
//! │  │   │  convert  │  │ price     │  │ schedule     │  │ overdue  │ │   │
//! │  │   │  families │  │ profit    │  │ due dates    │  │ profit   │ │   │
//! │  │   └───────────┘  └───────────┘  └──────────────┘  └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │        SQLite, credit ledger, cash register, backups            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Measurement units, families and conversion
//! - [`pricing`] - Line price, profit and stock availability
//! - [`amortization`] - Fixed-payment schedules and due dates
//! - [`installment`] - Installment config, overdue penalties, profit attribution
//! - [`types`] - Domain records (Product, Customer, CreditSale, ...)
//! - [`money`] - Money type stored as integer cents
//! - [`error`] - Domain error types
//! - [`validation`] - Form validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output. "Today" is an argument.
//! 2. **No I/O**: database, network and file system access is FORBIDDEN here
//! 3. **Integer Money**: stored amounts are cents (i64); rates are computed
//!    in f64 and rounded once, at the boundary
//! 4. **Calculators never fail**: bad intermediate values are logged and
//!    fall back to zero, so a half-typed form never errors
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::units::{convert_unit, Unit};
//!
//! // 1500 g is 1.5 kg
//! assert_eq!(convert_unit(1500.0, Unit::Gram, Unit::Kilogram), 1.5);
//!
//! // Liters and kilograms are different families: quantity passes through
//! assert_eq!(convert_unit(2.0, Unit::Liter, Unit::Kilogram), 2.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod amortization;
pub mod error;
pub mod installment;
pub mod money;
pub mod pricing;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use amortization::{build_schedule, AmortizationSchedule, ScheduleEntry};
pub use error::{CoreError, CoreResult, ValidationError};
pub use installment::InstallmentConfig;
pub use money::Money;
pub use pricing::{SaleLine, StockAvailability};
pub use types::*;
pub use units::{Unit, UnitFamily};
pub use validation::CustomerSelection;
