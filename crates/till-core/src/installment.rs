//! # Installment Lifecycle
//!
//! Pure rules for credit-sale installments: configuration, creation from a
//! schedule, overdue detection and profit attribution.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──── paid on/before due date ─────────────► paid (terminal)   │
//! │      │                                                  ▲               │
//! │      │ today > due_date                                 │               │
//! │      ▼  (refresh_overdue)                               │               │
//! │   overdue ──── paid late ───────────────────────────────┘               │
//! │      │                                                                  │
//! │      └─ days_overdue, penalty recomputed from scratch on every check    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here reads the clock: "today" is always an argument, so every
//! function is a pure function of (record, today).

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

use crate::amortization::{current_installment, AmortizationSchedule};
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{Installment, InstallmentStatus};
use crate::validation::validate_installment_config;

/// Daily penalty rate applied to an overdue installment's amount.
pub const PENALTY_RATE: f64 = 0.05;

/// Maximum number of installments of a credit sale.
pub const MAX_INSTALLMENTS: u32 = 36;

/// Maximum monthly interest rate, percent.
pub const MAX_INTEREST_RATE: f64 = 50.0;

/// Largest amount that can be financed: 10,000,000,000.00.
pub const MAX_PRINCIPAL_CENTS: i64 = 1_000_000_000_000;

// =============================================================================
// Configuration
// =============================================================================

/// How a credit sale is split. Immutable: the `with_*` methods return a
/// new value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InstallmentConfig {
    pub installment_count: u32,
    /// Monthly interest rate, percent.
    pub interest_rate_pct: f64,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// The installment due now. Earlier ones were settled before the sale
    /// was registered.
    pub current_installment: u32,
}

impl InstallmentConfig {
    /// A config starting at the first installment.
    pub fn new(installment_count: u32, interest_rate_pct: f64, start_date: NaiveDate) -> Self {
        InstallmentConfig {
            installment_count,
            interest_rate_pct,
            start_date,
            current_installment: 1,
        }
    }

    pub fn with_current_installment(self, current_installment: u32) -> Self {
        InstallmentConfig {
            current_installment,
            ..self
        }
    }

    /// Derives `current_installment` from the start date, the way the form
    /// does whenever the start date changes.
    pub fn with_detected_current(self, today: NaiveDate) -> Self {
        let current = current_installment(self.start_date, today, self.installment_count);
        self.with_current_installment(current)
    }

    /// Every rule this config breaks; empty when valid.
    pub fn violations(&self) -> Vec<ValidationError> {
        validate_installment_config(self)
    }

    pub fn is_valid(&self) -> bool {
        self.violations().is_empty()
    }
}

// =============================================================================
// Creation
// =============================================================================

/// Turns a schedule into installment records for `credit_sale_id`.
///
/// Installments numbered below `current_installment` are recorded as
/// paid on their due date: they belong to the part of the plan that was
/// settled before the sale was entered.
pub fn plan_installments(
    credit_sale_id: &str,
    schedule: &AmortizationSchedule,
    current_installment: u32,
) -> Vec<Installment> {
    schedule
        .entries
        .iter()
        .map(|entry| {
            let settled = entry.number < current_installment;
            Installment {
                id: Uuid::new_v4().to_string(),
                credit_sale_id: credit_sale_id.to_string(),
                number: entry.number as i64,
                due_date: entry.due_date,
                amount_cents: entry.payment.cents(),
                interest_cents: entry.interest.cents(),
                penalty_cents: 0,
                status: if settled {
                    InstallmentStatus::Paid
                } else {
                    InstallmentStatus::Pending
                },
                days_overdue: 0,
                paid_at: settled.then(|| entry.due_date.and_time(NaiveTime::MIN).and_utc()),
                payment_method: None,
            }
        })
        .collect()
}

// =============================================================================
// Overdue
// =============================================================================

/// [`refresh_overdue_with_rate`] at the standard [`PENALTY_RATE`].
pub fn refresh_overdue(installment: &Installment, today: NaiveDate) -> Installment {
    refresh_overdue_with_rate(installment, today, PENALTY_RATE)
}

/// Recomputes status, days overdue and penalty as of `today`.
///
/// Paid installments come back unchanged. The penalty is
/// `amount × rate × days_overdue`, recalculated from scratch each time, so
/// running the check twice on the same day changes nothing.
pub fn refresh_overdue_with_rate(
    installment: &Installment,
    today: NaiveDate,
    penalty_rate: f64,
) -> Installment {
    if installment.status == InstallmentStatus::Paid {
        return installment.clone();
    }

    let days = (today - installment.due_date).num_days();
    let mut refreshed = installment.clone();

    if days > 0 {
        refreshed.status = InstallmentStatus::Overdue;
        refreshed.days_overdue = days;
        refreshed.penalty_cents = installment.amount().scale(penalty_rate * days as f64).cents();
    } else {
        refreshed.status = InstallmentStatus::Pending;
        refreshed.days_overdue = 0;
        refreshed.penalty_cents = 0;
    }

    refreshed
}

// =============================================================================
// Aggregates
// =============================================================================

/// Sum of the amounts still owed (pending or overdue).
pub fn pending_total<'a>(installments: impl IntoIterator<Item = &'a Installment>) -> Money {
    installments
        .into_iter()
        .filter(|i| i.status.is_open())
        .map(Installment::amount)
        .sum()
}

/// Profit recognized when `paid_amount` of a credit sale is collected.
///
/// The goods' profit is recognized in proportion to the collected share of
/// the total with interest; the interest collected is profit in full.
///
/// ```rust
/// use till_core::installment::attributed_profit;
/// use till_core::money::Money;
///
/// // 300.00 profit on a 1200.00 sale, collecting 400.00 of which 20.00 interest
/// let profit = attributed_profit(
///     Money::from_cents(30_000),
///     Money::from_cents(120_000),
///     Money::from_cents(40_000),
///     Money::from_cents(2_000),
/// );
/// assert_eq!(profit.cents(), 12_000);
/// ```
pub fn attributed_profit(
    product_profit: Money,
    total_with_interest: Money,
    paid_amount: Money,
    paid_interest: Money,
) -> Money {
    if !total_with_interest.is_positive() {
        warn!(
            total = %total_with_interest,
            "Credit sale has no positive total, attributing interest only"
        );
        return paid_interest;
    }

    let share = paid_amount.to_decimal() / total_with_interest.to_decimal();
    product_profit.scale(share) + paid_interest
}

// =============================================================================
// Unit Tests
// =============================================================================
