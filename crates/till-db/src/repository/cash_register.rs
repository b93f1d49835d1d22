//! # Cash Register Repository
//!
//! The daily cash register: every amount that entered or left the till.
//!
//! ## Where Movements Come From
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  pay_installment ─────────┐                                            │
//! │  pay_all_installments ────┼──► income  (amount, attributed profit,     │
//! │                           │            credit_sale_id)                  │
//! │  record_income ───────────┘                                            │
//! │                                                                         │
//! │  record_expense ──────────────► expense (amount, profit = 0)           │
//! │                                                                         │
//! │  daily_summary(date) ── income − expense = balance, Σ profit           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A day is a UTC calendar day: `[date 00:00, date+1 00:00)`.

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbResult;
use till_core::{CashMovement, CoreError, Money, MovementKind, ValidationError};

/// Totals of one day of the cash register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub income: Money,
    pub expense: Money,
    /// Profit recognized by the day's income.
    pub profit: Money,
    /// `income − expense`.
    pub balance: Money,
    pub movement_count: i64,
}

/// Repository for cash movements.
#[derive(Debug, Clone)]
pub struct CashRegisterRepository {
    pool: SqlitePool,
}

impl CashRegisterRepository {
    /// Creates a new CashRegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CashRegisterRepository { pool }
    }

    /// Records a movement as given.
    pub async fn record(&self, movement: &CashMovement) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        insert_movement(&mut conn, movement).await
    }

    /// Records money received outside of credit sales (a counter sale).
    pub async fn record_income(
        &self,
        amount: Money,
        profit: Money,
        description: &str,
    ) -> DbResult<CashMovement> {
        let movement = new_movement(MovementKind::Income, amount, profit, description, None);
        self.record(&movement).await?;
        Ok(movement)
    }

    /// Records money taken out of the till.
    pub async fn record_expense(&self, amount: Money, description: &str) -> DbResult<CashMovement> {
        let movement = new_movement(MovementKind::Expense, amount, Money::zero(), description, None);
        self.record(&movement).await?;
        Ok(movement)
    }

    /// Movements of `date`, oldest first.
    pub async fn list_for_day(&self, date: NaiveDate) -> DbResult<Vec<CashMovement>> {
        let (start, end) = day_bounds(date);

        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, kind, amount_cents, profit_cents, description, credit_sale_id, created_at
            FROM cash_movements
            WHERE created_at >= ?1 AND created_at < ?2
            ORDER BY created_at
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Movements that pay the given credit sale.
    pub async fn list_by_credit_sale(&self, credit_sale_id: &str) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, kind, amount_cents, profit_cents, description, credit_sale_id, created_at
            FROM cash_movements
            WHERE credit_sale_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(credit_sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Totals for `date`.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let movements = self.list_for_day(date).await?;

        let mut income = Money::zero();
        let mut expense = Money::zero();
        let mut profit = Money::zero();

        for movement in &movements {
            match movement.kind {
                MovementKind::Income => income += Money::from_cents(movement.amount_cents),
                MovementKind::Expense => expense += Money::from_cents(movement.amount_cents),
            }
            profit += Money::from_cents(movement.profit_cents);
        }

        Ok(DailySummary {
            date,
            income,
            expense,
            profit,
            balance: income - expense,
            movement_count: movements.len() as i64,
        })
    }

    /// Deletes every movement of a credit sale.
    ///
    /// ## Returns
    /// Number of movements deleted.
    pub async fn delete_by_credit_sale(&self, credit_sale_id: &str) -> DbResult<u64> {
        let mut conn = self.pool.acquire().await?;
        delete_movements_of_sale(&mut conn, credit_sale_id).await
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Builds an unsaved movement stamped now.
pub fn new_movement(
    kind: MovementKind,
    amount: Money,
    profit: Money,
    description: &str,
    credit_sale_id: Option<&str>,
) -> CashMovement {
    CashMovement {
        id: Uuid::new_v4().to_string(),
        kind,
        amount_cents: amount.cents(),
        profit_cents: profit.cents(),
        description: description.to_string(),
        credit_sale_id: credit_sale_id.map(String::from),
        created_at: Utc::now(),
    }
}

fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = date
        .checked_add_days(Days::new(1))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

pub(crate) async fn insert_movement(
    conn: &mut SqliteConnection,
    movement: &CashMovement,
) -> DbResult<()> {
    if movement.amount_cents <= 0 {
        return Err(CoreError::from(ValidationError::MustBePositive {
            field: "amount".to_string(),
        })
        .into());
    }

    info!(
        id = %movement.id,
        kind = ?movement.kind,
        amount_cents = movement.amount_cents,
        profit_cents = movement.profit_cents,
        "Recording cash movement"
    );

    sqlx::query(
        r#"
        INSERT INTO cash_movements (
            id, kind, amount_cents, profit_cents, description, credit_sale_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&movement.id)
    .bind(movement.kind)
    .bind(movement.amount_cents)
    .bind(movement.profit_cents)
    .bind(&movement.description)
    .bind(&movement.credit_sale_id)
    .bind(movement.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_movements_of_sale(
    conn: &mut SqliteConnection,
    credit_sale_id: &str,
) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM cash_movements WHERE credit_sale_id = ?1")
        .bind(credit_sale_id)
        .execute(&mut *conn)
        .await?;

    debug!(credit_sale_id = %credit_sale_id, deleted = result.rows_affected(), "Deleted cash movements");
    Ok(result.rows_affected())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> CashRegisterRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.cash_register()
    }

    #[tokio::test]
    async fn test_daily_summary() {
        let repo = repo().await;
        repo.record_income(Money::from_cents(10_000), Money::from_cents(2_500), "Counter sale")
            .await
            .unwrap();
        repo.record_income(Money::from_cents(5_000), Money::from_cents(1_000), "Counter sale")
            .await
            .unwrap();
        repo.record_expense(Money::from_cents(3_000), "Delivery").await.unwrap();

        let today = Utc::now().date_naive();
        let summary = repo.daily_summary(today).await.unwrap();

        assert_eq!(summary.income.cents(), 15_000);
        assert_eq!(summary.expense.cents(), 3_000);
        assert_eq!(summary.profit.cents(), 3_500);
        assert_eq!(summary.balance.cents(), 12_000);
        assert_eq!(summary.movement_count, 3);
    }

    #[tokio::test]
    async fn test_other_days_are_excluded() {
        let repo = repo().await;

        let mut old = new_movement(
            MovementKind::Income,
            Money::from_cents(700),
            Money::zero(),
            "Last year",
            None,
        );
        old.created_at = NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
            .and_utc();
        repo.record(&old).await.unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(repo.list_for_day(day).await.unwrap().len(), 1);

        let next = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let summary = repo.daily_summary(next).await.unwrap();
        assert_eq!(summary.movement_count, 0);
        assert!(summary.balance.is_zero());
    }

    #[tokio::test]
    async fn test_non_positive_amount_rejected() {
        let repo = repo().await;
        let err = repo.record_expense(Money::zero(), "Nothing").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_day_bounds() {
        let day = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let (start, end) = day_bounds(day);
        assert_eq!(start.date_naive(), day);
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }
}
