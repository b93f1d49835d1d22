//! # Amortization
//!
//! Fixed-payment schedules for credit sales.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inputs: principal P, count n, monthly rate r (percent), start date d0  │
//! │                                                                         │
//! │  r == 0:  A = P / n, no interest                                        │
//! │                                                                         │
//! │  r  > 0:  i = r / 100                                                   │
//! │           A = P · i · (1+i)^n / ((1+i)^n − 1)     (annuity payment)     │
//! │                                                                         │
//! │  for k in 1..=n:                                                        │
//! │      interest_k  = balance · i                                          │
//! │      principal_k = A − interest_k                                       │
//! │      balance    −= principal_k          (shown floored at 0)            │
//! │      due_k       = d0 + k months                                        │
//! │                                                                         │
//! │  total = Σ rounded payments, total interest = total − P (floored at 0) │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic runs in f64; every figure is rounded to cents only when
//! it is written into a [`ScheduleEntry`].
//!
//! ```rust
//! use chrono::NaiveDate;
//! use till_core::amortization::build_schedule;
//! use till_core::money::Money;
//!
//! let start = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
//! let schedule = build_schedule(Money::from_cents(100_000), 3, 5.0, start);
//!
//! assert_eq!(schedule.payment.cents(), 36_721);
//! assert_eq!(schedule.total_interest.cents(), 10_163);
//! assert_eq!(schedule.entries[0].due_date, NaiveDate::from_ymd_opt(2026, 2, 15).unwrap());
//! ```

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Types
// =============================================================================

/// One row of an amortization schedule. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScheduleEntry {
    pub number: u32,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    pub payment: Money,
    pub interest: Money,
    pub principal: Money,
    /// Remaining balance after this payment.
    pub balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AmortizationSchedule {
    pub entries: Vec<ScheduleEntry>,
    /// The fixed periodic payment.
    pub payment: Money,
    pub total_interest: Money,
    pub total_with_interest: Money,
}

// =============================================================================
// Payment
// =============================================================================

/// Fixed periodic payment, unrounded.
///
/// Returns 0 when `count` is 0.
pub fn monthly_payment(principal: f64, count: u32, rate_pct: f64) -> f64 {
    if count == 0 {
        return 0.0;
    }

    let n = count as f64;
    if rate_pct <= 0.0 {
        return principal / n;
    }

    let i = rate_pct / 100.0;
    let growth = (1.0 + i).powi(count as i32);
    principal * i * growth / (growth - 1.0)
}

// =============================================================================
// Calendar
// =============================================================================

/// `date` plus `months` calendar months.
///
/// The day of month is kept when it exists in the target month and
/// clamped to the month's last day otherwise (Jan 31 + 1 month = Feb 28).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    match date.checked_add_months(Months::new(months)) {
        Some(due) => due,
        None => {
            warn!(%date, months, "Due date out of calendar range, keeping start date");
            date
        }
    }
}

/// Whole months between `start` and `today`, ignoring the day of month.
///
/// Negative when `start` is in the future.
pub fn months_elapsed(today: NaiveDate, start: NaiveDate) -> i64 {
    let today_index = today.year() as i64 * 12 + today.month0() as i64;
    let start_index = start.year() as i64 * 12 + start.month0() as i64;
    today_index - start_index
}

/// Which installment is due now: `months_elapsed + 1`, clamped to
/// `[1, count]`.
///
/// ```rust
/// use chrono::NaiveDate;
/// use till_core::amortization::current_installment;
///
/// let start = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
/// let today = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
/// assert_eq!(current_installment(start, today, 12), 3);
/// ```
pub fn current_installment(start: NaiveDate, today: NaiveDate, count: u32) -> u32 {
    let current = (months_elapsed(today, start) + 1).max(1);
    current.min(count.max(1) as i64) as u32
}

// =============================================================================
// Schedule
// =============================================================================

/// Builds the full amortization schedule.
///
/// A zero `count` yields an empty schedule; configurations are validated
/// before they reach this point.
pub fn build_schedule(
    principal: Money,
    count: u32,
    rate_pct: f64,
    start_date: NaiveDate,
) -> AmortizationSchedule {
    let p = principal.to_decimal();
    let payment = monthly_payment(p, count, rate_pct);
    let i = if rate_pct > 0.0 { rate_pct / 100.0 } else { 0.0 };

    let mut balance = p;
    let mut entries = Vec::with_capacity(count as usize);

    for number in 1..=count {
        let interest = balance * i;
        let principal_part = payment - interest;
        balance -= principal_part;

        entries.push(ScheduleEntry {
            number,
            due_date: add_months(start_date, number),
            payment: Money::from_decimal(payment),
            interest: Money::from_decimal(interest),
            principal: Money::from_decimal(principal_part),
            balance: Money::from_decimal(balance.max(0.0)),
        });
    }

    // What the installments actually add up to, so paying all of them
    // settles the whole total
    let total_with_interest: Money = entries.iter().map(|e| e.payment).sum();
    let total_interest = if total_with_interest > principal {
        total_with_interest - principal
    } else {
        Money::zero()
    };

    AmortizationSchedule {
        entries,
        payment: Money::from_decimal(payment),
        total_interest,
        total_with_interest,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_zero_rate_equal_payments() {
        let schedule = build_schedule(Money::from_cents(1_200_000), 12, 0.0, date(2026, 1, 10));

        assert_eq!(schedule.payment.cents(), 100_000);
        assert!(schedule.total_interest.is_zero());
        assert_eq!(schedule.total_with_interest.cents(), 1_200_000);
        assert_eq!(schedule.entries.len(), 12);
        for entry in &schedule.entries {
            assert_eq!(entry.payment.cents(), 100_000);
            assert!(entry.interest.is_zero());
        }
        assert!(schedule.entries[11].balance.is_zero());
    }

    #[test]
    fn test_zero_rate_payment_times_n_within_rounding() {
        let schedule = build_schedule(Money::from_cents(100_000), 3, 0.0, date(2026, 1, 10));
        let paid = schedule.payment * 3;
        assert!((paid - Money::from_cents(100_000)).abs().cents() <= 1);
    }

    #[test]
    fn test_zero_rate_total_is_what_installments_add_up_to() {
        let schedule = build_schedule(Money::from_cents(100_000), 3, 0.0, date(2026, 1, 10));

        assert_eq!(schedule.payment.cents(), 33_333);
        let installments: Money = schedule.entries.iter().map(|e| e.payment).sum();
        assert_eq!(schedule.total_with_interest, installments);
        assert_eq!(schedule.total_with_interest.cents(), 99_999);
        assert!(schedule.total_interest.is_zero());
    }

    #[test]
    fn test_annuity_scenario() {
        let schedule = build_schedule(Money::from_cents(100_000), 3, 5.0, date(2026, 1, 15));

        assert_eq!(schedule.payment.cents(), 36_721);
        assert_eq!(schedule.total_interest.cents(), 10_163);
        assert_eq!(schedule.total_with_interest.cents(), 110_163);

        // First month's interest is 5% of the full principal
        assert_eq!(schedule.entries[0].interest.cents(), 5_000);
        assert!(schedule.entries[2].balance.is_zero());
    }

    #[test]
    fn test_interest_sum_matches_total_within_rounding() {
        for (principal, n, rate) in [(100_000, 3, 5.0), (2_500_000, 24, 3.5), (99_999, 36, 50.0)] {
            let schedule = build_schedule(Money::from_cents(principal), n, rate, date(2026, 6, 1));
            let interest_sum: Money = schedule.entries.iter().map(|e| e.interest).sum();
            let diff = (interest_sum - schedule.total_interest).abs().cents();
            assert!(diff <= n as i64, "n={n} rate={rate} diff={diff}");
            assert!(schedule.entries.last().unwrap().balance.is_zero());
        }
    }

    #[test]
    fn test_principal_portions_repay_principal() {
        let schedule = build_schedule(Money::from_cents(2_500_000), 24, 3.5, date(2026, 6, 1));
        let repaid: Money = schedule.entries.iter().map(|e| e.principal).sum();
        assert!((repaid - Money::from_cents(2_500_000)).abs().cents() <= 24);
    }

    #[test]
    fn test_balance_is_non_increasing() {
        let schedule = build_schedule(Money::from_cents(500_000), 12, 2.0, date(2026, 6, 1));
        for pair in schedule.entries.windows(2) {
            assert!(pair[1].balance <= pair[0].balance);
        }
    }

    #[test]
    fn test_empty_schedule_for_zero_count() {
        let schedule = build_schedule(Money::from_cents(100_000), 0, 5.0, date(2026, 1, 1));
        assert!(schedule.entries.is_empty());
        assert!(schedule.payment.is_zero());
        assert!(schedule.total_interest.is_zero());
    }

    #[test]
    fn test_due_dates_are_monthly() {
        let schedule = build_schedule(Money::from_cents(300_000), 3, 0.0, date(2026, 10, 19));
        let dues: Vec<NaiveDate> = schedule.entries.iter().map(|e| e.due_date).collect();
        assert_eq!(dues, vec![date(2026, 11, 19), date(2026, 12, 19), date(2027, 1, 19)]);
    }

    #[test]
    fn test_add_months_clamps_to_month_end() {
        assert_eq!(add_months(date(2026, 1, 31), 1), date(2026, 2, 28));
        assert_eq!(add_months(date(2028, 1, 31), 1), date(2028, 2, 29));
        assert_eq!(add_months(date(2026, 1, 31), 2), date(2026, 3, 31));
    }

    #[test]
    fn test_months_elapsed_ignores_day() {
        assert_eq!(months_elapsed(date(2026, 3, 1), date(2026, 2, 28)), 1);
        assert_eq!(months_elapsed(date(2027, 1, 5), date(2026, 11, 30)), 2);
        assert_eq!(months_elapsed(date(2026, 1, 5), date(2026, 4, 1)), -3);
    }

    #[test]
    fn test_current_installment() {
        let today = date(2026, 10, 19);
        assert_eq!(current_installment(today, today, 12), 1);
        assert_eq!(current_installment(date(2026, 8, 19), today, 12), 3);
        // Future start: still the first installment
        assert_eq!(current_installment(date(2027, 2, 1), today, 12), 1);
        // Clamped to the installment count
        assert_eq!(current_installment(date(2020, 1, 1), today, 6), 6);
    }
}
