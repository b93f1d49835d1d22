//! # Domain Types
//!
//! Records shared by the calculators and the database layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │   CreditSale    │   │  Installment    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  unit           │   │  customer_id    │◄──│  credit_sale_id │       │
//! │  │  price_cents    │   │  principal      │ 1:N│  number 1..N   │       │
//! │  │  cost_cents     │   │  rate, count    │   │  due_date       │       │
//! │  │  discount_pct   │   │  start_date     │   │  status         │       │
//! │  └─────────────────┘   └────────┬────────┘   └─────────────────┘       │
//! │                                 │                                       │
//! │  ┌─────────────────┐            │            ┌─────────────────┐       │
//! │  │    Customer     │◄───────────┘            │  CashMovement   │       │
//! │  │  pending_balance│  (sum of open           │  income/expense │       │
//! │  │  (denormalized) │   installments)         │  credit_sale_id?│       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::units::Unit;

// =============================================================================
// Product
// =============================================================================

/// A catalog product. Prices and stock are per its native `unit`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    pub name: String,

    /// Native unit: the unit price, cost and stock are expressed in.
    pub unit: Unit,

    /// Sale price per native unit, in cents.
    pub price_cents: i64,

    /// Cost per native unit, in cents.
    pub cost_cents: i64,

    /// Percentage discount (0-100) applied to every sale of this product.
    pub discount_pct: Option<f64>,

    /// Current stock in the native unit. `None` means not tracked.
    pub current_stock: Option<f64>,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Discount percentage, 0 when the product has none.
    #[inline]
    pub fn discount(&self) -> f64 {
        self.discount_pct.unwrap_or(0.0)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer who can buy on credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,
    /// Sum of every pending/overdue installment across the customer's
    /// credit sales. Recomputed by each payment operation.
    pub pending_balance_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn pending_balance(&self) -> Money {
        Money::from_cents(self.pending_balance_cents)
    }
}

// =============================================================================
// Credit Sale
// =============================================================================

/// A sale paid later, split into installments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditSale {
    pub id: String,
    pub customer_id: String,
    /// Amount financed (sale subtotal plus any manual line).
    pub principal_cents: i64,
    /// Monthly interest rate, percent.
    pub interest_rate_pct: f64,
    pub installment_count: i64,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    /// Sum of all installment amounts.
    pub total_with_interest_cents: i64,
    /// Profit of the goods sold, recognized as installments are paid.
    pub product_profit_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CreditSale {
    #[inline]
    pub fn principal(&self) -> Money {
        Money::from_cents(self.principal_cents)
    }

    #[inline]
    pub fn total_with_interest(&self) -> Money {
        Money::from_cents(self.total_with_interest_cents)
    }

    #[inline]
    pub fn product_profit(&self) -> Money {
        Money::from_cents(self.product_profit_cents)
    }
}

// =============================================================================
// Installment Status
// =============================================================================

/// Lifecycle of one installment.
///
/// ```text
///   pending ──────────────► paid (terminal)
///      │                     ▲
///      └──► overdue ─────────┘
/// ```
/// `overdue` is derived from the due date every time overdue checking runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Overdue,
    Paid,
}

impl InstallmentStatus {
    /// Pending or overdue: still owed.
    #[inline]
    pub const fn is_open(&self) -> bool {
        matches!(self, InstallmentStatus::Pending | InstallmentStatus::Overdue)
    }
}

impl Default for InstallmentStatus {
    fn default() -> Self {
        InstallmentStatus::Pending
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

// =============================================================================
// Installment
// =============================================================================

/// One scheduled payment of a credit sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Installment {
    pub id: String,
    pub credit_sale_id: String,
    /// Sequence number, 1..=installment_count.
    pub number: i64,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    /// Amount owed for this installment (principal + interest portions).
    pub amount_cents: i64,
    /// Interest portion of `amount_cents`.
    pub interest_cents: i64,
    /// Late penalty as of the last overdue check.
    pub penalty_cents: i64,
    pub status: InstallmentStatus,
    pub days_overdue: i64,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_method: Option<PaymentMethod>,
}

impl Installment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn interest(&self) -> Money {
        Money::from_cents(self.interest_cents)
    }

    #[inline]
    pub fn penalty(&self) -> Money {
        Money::from_cents(self.penalty_cents)
    }
}

// =============================================================================
// Cash Register
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Income,
    Expense,
}

/// One row of the daily cash register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashMovement {
    pub id: String,
    pub kind: MovementKind,
    pub amount_cents: i64,
    /// Profit recognized by this movement (0 for expenses).
    pub profit_cents: i64,
    pub description: String,
    /// Credit sale this movement pays, if any.
    pub credit_sale_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    /// Amount with sign: positive for income, negative for expenses.
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            MovementKind::Income => Money::from_cents(self.amount_cents),
            MovementKind::Expense => Money::from_cents(-self.amount_cents),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installment_status_default_and_open() {
        assert_eq!(InstallmentStatus::default(), InstallmentStatus::Pending);
        assert!(InstallmentStatus::Pending.is_open());
        assert!(InstallmentStatus::Overdue.is_open());
        assert!(!InstallmentStatus::Paid.is_open());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&InstallmentStatus::Overdue).unwrap();
        assert_eq!(json, "\"overdue\"");
    }

    #[test]
    fn test_signed_amount() {
        let mut movement = CashMovement {
            id: "m-1".to_string(),
            kind: MovementKind::Income,
            amount_cents: 1500,
            profit_cents: 300,
            description: "Installment 1/3".to_string(),
            credit_sale_id: None,
            created_at: Utc::now(),
        };
        assert_eq!(movement.signed_amount().cents(), 1500);

        movement.kind = MovementKind::Expense;
        assert_eq!(movement.signed_amount().cents(), -1500);
    }
}
