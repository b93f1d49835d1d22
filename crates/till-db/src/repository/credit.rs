//! # Credit Sale Repository
//!
//! Credit sales, their installments and every operation that moves money
//! between them, the customer balance and the cash register.
//!
//! ## Units of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Each operation below is ONE SQLite transaction: all or nothing.       │
//! │                                                                         │
//! │  create_credit_sale                                                    │
//! │  ├── customer (existing or new)                                        │
//! │  ├── credit_sales row                                                  │
//! │  ├── N installments (below current_installment: already paid)          │
//! │  ├── stock −= quantity in native unit, per line                        │
//! │  └── customer.pending_balance recomputed                               │
//! │                                                                         │
//! │  pay_installment / pay_all_installments                                │
//! │  ├── installment(s) → paid                                             │
//! │  ├── one income cash movement (amount, attributed profit)              │
//! │  └── customer.pending_balance recomputed                               │
//! │                                                                         │
//! │  delete_credit_sale  (only when nothing is pending)                    │
//! │  ├── cash movements of the sale                                        │
//! │  ├── installments                                                      │
//! │  ├── credit_sales row                                                  │
//! │  └── customer.pending_balance recomputed                               │
//! │                                                                         │
//! │  refresh_overdue(today)                                                │
//! │  └── status / days_overdue / penalty of every open installment         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All calculations come from till-core; this module only sequences them
//! and persists the result.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::cash_register::{delete_movements_of_sale, insert_movement, new_movement};
use crate::repository::customer::{fetch_customer, insert_customer, recompute_pending_balance};
use crate::repository::product::{adjust_stock, fetch_product};
use till_core::amortization::build_schedule;
use till_core::installment::{
    attributed_profit, plan_installments, refresh_overdue_with_rate, InstallmentConfig,
    MAX_PRINCIPAL_CENTS, PENALTY_RATE,
};
use till_core::pricing::{calculate_total_profit, check_stock_availability, sale_subtotal};
use till_core::validation::{
    validate_credit_customer, validate_principal, validate_quantity, CustomerSelection,
};
use till_core::{
    CashMovement, CoreError, CreditSale, Customer, Installment, InstallmentStatus, Money,
    MovementKind, PaymentMethod, Product, SaleLine, Unit, ValidationError,
};

// =============================================================================
// Request / Response Types
// =============================================================================

/// One catalog line of a credit sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLine {
    pub product_id: String,
    pub quantity: f64,
    pub unit: Unit,
}

/// Everything needed to register a credit sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreditSale {
    /// Required; `None` is rejected.
    pub customer: Option<CustomerSelection>,
    pub lines: Vec<CreditLine>,
    /// Manually priced amount added to the catalog lines.
    pub manual_amount: Money,
    /// Profit of the manual amount, percent.
    pub manual_profit_pct: f64,
    pub config: InstallmentConfig,
    pub notes: Option<String>,
}

/// A credit sale with its installments, ordered by number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditSaleDetail {
    pub sale: CreditSale,
    pub customer: Customer,
    pub installments: Vec<Installment>,
}

/// Outcome of a payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// The income posted to the cash register.
    pub movement: CashMovement,
    /// Installments settled by this payment.
    pub paid: Vec<Installment>,
    /// Customer balance after the payment.
    pub pending_balance: Money,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for credit sales and installments.
///
/// ## Usage
/// ```rust,ignore
/// let credit = db.credit_sales();
///
/// let detail = credit.create_credit_sale(&request).await?;
/// let receipt = credit
///     .pay_installment(&detail.installments[0].id, PaymentMethod::Cash)
///     .await?;
/// println!("Still owed: {}", receipt.pending_balance);
/// ```
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
    penalty_rate: f64,
}

impl CreditRepository {
    /// Creates a new CreditRepository using the standard penalty rate.
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository {
            pool,
            penalty_rate: PENALTY_RATE,
        }
    }

    /// Uses `rate` as the daily overdue penalty.
    pub fn with_penalty_rate(mut self, rate: f64) -> Self {
        self.penalty_rate = rate;
        self
    }

    // -------------------------------------------------------------------------
    // Lookups
    // -------------------------------------------------------------------------

    /// Gets a credit sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<CreditSale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Credit sales of a customer, newest first.
    pub async fn list_by_customer(&self, customer_id: &str) -> DbResult<Vec<CreditSale>> {
        let sales = sqlx::query_as::<_, CreditSale>(
            r#"
            SELECT
                id, customer_id, principal_cents, interest_rate_pct, installment_count,
                start_date, total_with_interest_cents, product_profit_cents, notes, created_at
            FROM credit_sales
            WHERE customer_id = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Installments of a credit sale, ordered by number.
    pub async fn installments(&self, credit_sale_id: &str) -> DbResult<Vec<Installment>> {
        let mut conn = self.pool.acquire().await?;
        fetch_installments(&mut conn, credit_sale_id).await
    }

    /// Open installments due on or before `date`, across all sales.
    pub async fn open_installments_due_by(&self, date: NaiveDate) -> DbResult<Vec<Installment>> {
        let installments = sqlx::query_as::<_, Installment>(
            r#"
            SELECT
                id, credit_sale_id, number, due_date, amount_cents, interest_cents,
                penalty_cents, status, days_overdue, paid_at, payment_method
            FROM installments
            WHERE status IN ('pending', 'overdue') AND due_date <= ?1
            ORDER BY due_date, number
            "#,
        )
        .bind(date)
        .fetch_all(&self.pool)
        .await?;

        Ok(installments)
    }

    /// The sale, its customer and installments.
    pub async fn detail(&self, credit_sale_id: &str) -> DbResult<CreditSaleDetail> {
        let mut conn = self.pool.acquire().await?;
        load_detail(&mut conn, credit_sale_id).await
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Registers a credit sale.
    ///
    /// ## Errors
    /// - `Validation` - no customer, bad quantity, principal not in
    ///   `(0, MAX_PRINCIPAL_CENTS]`, or not enough stock once every line
    ///   of the same product is counted
    /// - `ProductInactive` - the product was soft-deleted
    /// - `InvalidInstallmentConfig` - every violated installment rule
    /// - `CustomerNotFound` / `ProductNotFound`
    pub async fn create_credit_sale(&self, request: &NewCreditSale) -> DbResult<CreditSaleDetail> {
        validate_credit_customer(request.customer.as_ref()).map_err(CoreError::from)?;

        let violations = request.config.violations();
        if !violations.is_empty() {
            return Err(CoreError::InvalidInstallmentConfig(violations).into());
        }

        for line in &request.lines {
            validate_quantity(line.quantity).map_err(CoreError::from)?;
        }

        if request.manual_amount.is_negative() {
            return Err(CoreError::from(ValidationError::MustBePositive {
                field: "manual_amount".to_string(),
            })
            .into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let customer = match &request.customer {
            Some(CustomerSelection::Existing(id)) => fetch_customer(&mut tx, id)
                .await?
                .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            Some(CustomerSelection::New(name)) => insert_customer(&mut tx, name, None).await?,
            None => {
                return Err(CoreError::from(ValidationError::Required {
                    field: "customer".to_string(),
                })
                .into())
            }
        };

        // Native quantity already taken by earlier lines, per product
        let mut claimed: HashMap<String, f64> = HashMap::new();
        let mut lines = Vec::with_capacity(request.lines.len());
        for line in &request.lines {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.is_active {
                return Err(CoreError::ProductInactive(product.id.clone()).into());
            }

            let taken = claimed.get(&product.id).copied().unwrap_or(0.0);
            let remaining = Product {
                current_stock: product.current_stock.map(|stock| stock - taken),
                ..product.clone()
            };

            let availability = check_stock_availability(&remaining, line.quantity, line.unit);
            if !availability.available {
                warn!(
                    product_id = %product.id,
                    requested = line.quantity,
                    available = availability.available_quantity,
                    unit = %availability.available_unit,
                    "Not enough stock for credit sale line"
                );
                return Err(CoreError::from(ValidationError::OutOfRange {
                    field: format!("quantity of {}", product.name),
                    min: 0.0,
                    max: availability.available_quantity,
                })
                .into());
            }

            let sale_line = SaleLine::new(product, line.quantity, line.unit);
            *claimed.entry(sale_line.product.id.clone()).or_insert(0.0) += sale_line.native_quantity();
            lines.push(sale_line);
        }

        let principal = sale_subtotal(&lines)
            .and_then(|subtotal| subtotal.checked_add(request.manual_amount))
            .ok_or_else(|| {
                CoreError::from(ValidationError::OutOfRange {
                    field: "principal".to_string(),
                    min: 0.01,
                    max: MAX_PRINCIPAL_CENTS as f64 / 100.0,
                })
            })?;
        validate_principal(principal).map_err(CoreError::from)?;

        let product_profit =
            calculate_total_profit(&lines, request.manual_amount, request.manual_profit_pct);

        let config = &request.config;
        let schedule = build_schedule(
            principal,
            config.installment_count,
            config.interest_rate_pct,
            config.start_date,
        );

        let sale = CreditSale {
            id: Uuid::new_v4().to_string(),
            customer_id: customer.id.clone(),
            principal_cents: principal.cents(),
            interest_rate_pct: config.interest_rate_pct,
            installment_count: config.installment_count as i64,
            start_date: config.start_date,
            total_with_interest_cents: schedule.total_with_interest.cents(),
            product_profit_cents: product_profit.cents(),
            notes: request.notes.clone(),
            created_at: Utc::now(),
        };

        insert_sale(&mut tx, &sale).await?;

        let installments = plan_installments(&sale.id, &schedule, config.current_installment);
        for installment in &installments {
            insert_installment(&mut tx, installment).await?;
        }

        for line in &lines {
            adjust_stock(&mut tx, &line.product.id, -line.native_quantity()).await?;
        }

        let pending_balance = recompute_pending_balance(&mut tx, &customer.id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            customer_id = %customer.id,
            principal = %principal,
            total_with_interest = %schedule.total_with_interest,
            installments = installments.len(),
            current_installment = config.current_installment,
            "Credit sale created"
        );

        Ok(CreditSaleDetail {
            sale,
            customer: Customer {
                pending_balance_cents: pending_balance.cents(),
                ..customer
            },
            installments,
        })
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Pays one installment.
    ///
    /// ## Errors
    /// - `InstallmentNotFound`
    /// - `InstallmentAlreadyPaid` - paid is terminal; nothing is written
    pub async fn pay_installment(
        &self,
        installment_id: &str,
        method: PaymentMethod,
    ) -> DbResult<PaymentReceipt> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let installment = fetch_installment(&mut tx, installment_id)
            .await?
            .ok_or_else(|| CoreError::InstallmentNotFound(installment_id.to_string()))?;

        if installment.status == InstallmentStatus::Paid {
            return Err(CoreError::InstallmentAlreadyPaid {
                credit_sale_id: installment.credit_sale_id.clone(),
                number: installment.number,
            }
            .into());
        }

        let sale = fetch_sale(&mut tx, &installment.credit_sale_id)
            .await?
            .ok_or_else(|| CoreError::CreditSaleNotFound(installment.credit_sale_id.clone()))?;

        let profit = attributed_profit(
            sale.product_profit(),
            sale.total_with_interest(),
            installment.amount(),
            installment.interest(),
        );

        let paid = mark_paid(&mut tx, &installment, method).await?;

        let description = format!(
            "Installment {}/{} of credit sale {}",
            installment.number, sale.installment_count, sale.id
        );
        let movement = new_movement(
            MovementKind::Income,
            installment.amount(),
            profit,
            &description,
            Some(&sale.id),
        );
        insert_movement(&mut tx, &movement).await?;

        let pending_balance = recompute_pending_balance(&mut tx, &sale.customer_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            installment = installment.number,
            amount = %installment.amount(),
            profit = %profit,
            method = ?method,
            "Installment paid"
        );

        Ok(PaymentReceipt {
            movement,
            paid: vec![paid],
            pending_balance,
        })
    }

    /// Pays every pending and overdue installment of a sale at once.
    ///
    /// One cash movement is posted for the summed amount and profit.
    ///
    /// ## Errors
    /// - `CreditSaleNotFound`
    /// - `NothingToPay` - every installment is already paid
    pub async fn pay_all_installments(
        &self,
        credit_sale_id: &str,
        method: PaymentMethod,
    ) -> DbResult<PaymentReceipt> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale = fetch_sale(&mut tx, credit_sale_id)
            .await?
            .ok_or_else(|| CoreError::CreditSaleNotFound(credit_sale_id.to_string()))?;

        let open: Vec<Installment> = fetch_installments(&mut tx, credit_sale_id)
            .await?
            .into_iter()
            .filter(|i| i.status.is_open())
            .collect();

        if open.is_empty() {
            return Err(CoreError::NothingToPay(credit_sale_id.to_string()).into());
        }

        let mut amount = Money::zero();
        let mut profit = Money::zero();
        let mut paid = Vec::with_capacity(open.len());

        for installment in &open {
            amount += installment.amount();
            profit += attributed_profit(
                sale.product_profit(),
                sale.total_with_interest(),
                installment.amount(),
                installment.interest(),
            );
            paid.push(mark_paid(&mut tx, installment, method).await?);
        }

        let description = format!(
            "Settlement of {} installments of credit sale {}",
            open.len(),
            sale.id
        );
        let movement = new_movement(MovementKind::Income, amount, profit, &description, Some(&sale.id));
        insert_movement(&mut tx, &movement).await?;

        let pending_balance = recompute_pending_balance(&mut tx, &sale.customer_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            installments = paid.len(),
            amount = %amount,
            profit = %profit,
            "All installments paid"
        );

        Ok(PaymentReceipt {
            movement,
            paid,
            pending_balance,
        })
    }

    // -------------------------------------------------------------------------
    // Delete
    // -------------------------------------------------------------------------

    /// Deletes a fully paid credit sale with its installments and cash
    /// movements.
    ///
    /// ## Errors
    /// - `CreditSaleNotFound`
    /// - `PendingInstallmentsRemain` - nothing is deleted
    pub async fn delete_credit_sale(&self, credit_sale_id: &str) -> DbResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let sale = fetch_sale(&mut tx, credit_sale_id)
            .await?
            .ok_or_else(|| CoreError::CreditSaleNotFound(credit_sale_id.to_string()))?;

        let open: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM installments
            WHERE credit_sale_id = ?1 AND status IN ('pending', 'overdue')
            "#,
        )
        .bind(credit_sale_id)
        .fetch_one(&mut *tx)
        .await?;

        if open > 0 {
            return Err(CoreError::PendingInstallmentsRemain {
                credit_sale_id: credit_sale_id.to_string(),
                count: open,
            }
            .into());
        }

        let movements = delete_movements_of_sale(&mut tx, credit_sale_id).await?;

        sqlx::query("DELETE FROM installments WHERE credit_sale_id = ?1")
            .bind(credit_sale_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM credit_sales WHERE id = ?1")
            .bind(credit_sale_id)
            .execute(&mut *tx)
            .await?;

        recompute_pending_balance(&mut tx, &sale.customer_id).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(sale_id = %credit_sale_id, movements, "Credit sale deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Overdue
    // -------------------------------------------------------------------------

    /// Recomputes status, days overdue and penalty of every open
    /// installment as of `today`.
    ///
    /// ## Returns
    /// Number of installments whose stored state changed. Running it again
    /// on the same day returns 0.
    pub async fn refresh_overdue(&self, today: NaiveDate) -> DbResult<usize> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let open = sqlx::query_as::<_, Installment>(
            r#"
            SELECT
                id, credit_sale_id, number, due_date, amount_cents, interest_cents,
                penalty_cents, status, days_overdue, paid_at, payment_method
            FROM installments
            WHERE status IN ('pending', 'overdue')
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        let mut changed = 0;
        for installment in &open {
            let refreshed = refresh_overdue_with_rate(installment, today, self.penalty_rate);
            if refreshed == *installment {
                continue;
            }

            sqlx::query(
                r#"
                UPDATE installments
                SET status = ?2, days_overdue = ?3, penalty_cents = ?4
                WHERE id = ?1
                "#,
            )
            .bind(&refreshed.id)
            .bind(refreshed.status)
            .bind(refreshed.days_overdue)
            .bind(refreshed.penalty_cents)
            .execute(&mut *tx)
            .await?;

            changed += 1;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(%today, checked = open.len(), changed, "Overdue refresh complete");
        Ok(changed)
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<CreditSale>> {
    let sale = sqlx::query_as::<_, CreditSale>(
        r#"
        SELECT
            id, customer_id, principal_cents, interest_rate_pct, installment_count,
            start_date, total_with_interest_cents, product_profit_cents, notes, created_at
        FROM credit_sales
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(sale)
}

async fn fetch_installment(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Installment>> {
    let installment = sqlx::query_as::<_, Installment>(
        r#"
        SELECT
            id, credit_sale_id, number, due_date, amount_cents, interest_cents,
            penalty_cents, status, days_overdue, paid_at, payment_method
        FROM installments
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(installment)
}

async fn fetch_installments(
    conn: &mut SqliteConnection,
    credit_sale_id: &str,
) -> DbResult<Vec<Installment>> {
    let installments = sqlx::query_as::<_, Installment>(
        r#"
        SELECT
            id, credit_sale_id, number, due_date, amount_cents, interest_cents,
            penalty_cents, status, days_overdue, paid_at, payment_method
        FROM installments
        WHERE credit_sale_id = ?1
        ORDER BY number
        "#,
    )
    .bind(credit_sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(installments)
}

async fn load_detail(conn: &mut SqliteConnection, credit_sale_id: &str) -> DbResult<CreditSaleDetail> {
    let sale = fetch_sale(conn, credit_sale_id)
        .await?
        .ok_or_else(|| CoreError::CreditSaleNotFound(credit_sale_id.to_string()))?;

    let customer = fetch_customer(conn, &sale.customer_id)
        .await?
        .ok_or_else(|| CoreError::CustomerNotFound(sale.customer_id.clone()))?;

    let installments = fetch_installments(conn, credit_sale_id).await?;

    Ok(CreditSaleDetail {
        sale,
        customer,
        installments,
    })
}

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &CreditSale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credit_sales (
            id, customer_id, principal_cents, interest_rate_pct, installment_count,
            start_date, total_with_interest_cents, product_profit_cents, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(sale.principal_cents)
    .bind(sale.interest_rate_pct)
    .bind(sale.installment_count)
    .bind(sale.start_date)
    .bind(sale.total_with_interest_cents)
    .bind(sale.product_profit_cents)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn insert_installment(
    conn: &mut SqliteConnection,
    installment: &Installment,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO installments (
            id, credit_sale_id, number, due_date, amount_cents, interest_cents,
            penalty_cents, status, days_overdue, paid_at, payment_method
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&installment.id)
    .bind(&installment.credit_sale_id)
    .bind(installment.number)
    .bind(installment.due_date)
    .bind(installment.amount_cents)
    .bind(installment.interest_cents)
    .bind(installment.penalty_cents)
    .bind(installment.status)
    .bind(installment.days_overdue)
    .bind(installment.paid_at)
    .bind(installment.payment_method)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn mark_paid(
    conn: &mut SqliteConnection,
    installment: &Installment,
    method: PaymentMethod,
) -> DbResult<Installment> {
    let paid = Installment {
        status: InstallmentStatus::Paid,
        paid_at: Some(Utc::now()),
        payment_method: Some(method),
        ..installment.clone()
    };

    // Guarded on the open status so a concurrent payment cannot pay twice
    let result = sqlx::query(
        r#"
        UPDATE installments
        SET status = 'paid', paid_at = ?2, payment_method = ?3
        WHERE id = ?1 AND status IN ('pending', 'overdue')
        "#,
    )
    .bind(&paid.id)
    .bind(paid.paid_at)
    .bind(paid.payment_method)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::InstallmentAlreadyPaid {
            credit_sale_id: installment.credit_sale_id.clone(),
            number: installment.number,
        }
        .into());
    }

    Ok(paid)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::tests::sample_product;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut product = sample_product("TV-32", Unit::Unit, Some(5.0));
        product.price_cents = 100_000;
        product.cost_cents = 70_000;
        db.products().insert(&product).await.unwrap();
        (db, product.id)
    }

    fn request(product_id: &str, config: InstallmentConfig) -> NewCreditSale {
        NewCreditSale {
            customer: Some(CustomerSelection::New("Ana Souza".to_string())),
            lines: vec![CreditLine {
                product_id: product_id.to_string(),
                quantity: 1.0,
                unit: Unit::Unit,
            }],
            manual_amount: Money::zero(),
            manual_profit_pct: 0.0,
            config,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_credit_sale() {
        let (db, product_id) = setup().await;
        let config = InstallmentConfig::new(3, 5.0, date(2026, 1, 15));

        let detail = db
            .credit_sales()
            .create_credit_sale(&request(&product_id, config))
            .await
            .unwrap();

        assert_eq!(detail.sale.principal_cents, 100_000);
        assert_eq!(detail.sale.total_with_interest_cents, 110_163);
        assert_eq!(detail.sale.product_profit_cents, 30_000);
        assert_eq!(detail.installments.len(), 3);
        assert!(detail.installments.iter().all(|i| i.amount_cents == 36_721));
        assert_eq!(detail.installments[0].due_date, date(2026, 2, 15));
        assert_eq!(detail.customer.pending_balance_cents, 3 * 36_721);

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, Some(4.0));

        let stored = db.credit_sales().detail(&detail.sale.id).await.unwrap();
        assert_eq!(stored.installments.len(), 3);
        assert_eq!(stored.customer.pending_balance_cents, 3 * 36_721);
    }

    #[tokio::test]
    async fn test_create_requires_customer() {
        let (db, product_id) = setup().await;
        let mut req = request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 1)));
        req.customer = None;

        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_config_without_writing() {
        let (db, product_id) = setup().await;
        let req = request(&product_id, InstallmentConfig::new(37, 51.0, date(2026, 1, 1)));

        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        match err {
            DbError::Core(CoreError::InvalidInstallmentConfig(violations)) => {
                assert_eq!(violations.len(), 2)
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(db.customers().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_short_stock_and_rolls_back() {
        let (db, product_id) = setup().await;
        let mut req = request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 1)));
        req.lines[0].quantity = 6.0;

        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        // The new customer was inserted before the check and must be gone
        assert!(db.customers().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lines_of_same_product_share_stock() {
        let (db, product_id) = setup().await;
        let mut req = request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 1)));
        req.lines[0].quantity = 3.0;
        req.lines.push(req.lines[0].clone());

        // 3 + 3 against 5 in stock
        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        match err {
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { max, .. })) => {
                assert_eq!(max, 2.0)
            }
            other => panic!("unexpected error: {other}"),
        }

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, Some(5.0));
        assert!(db.customers().list().await.unwrap().is_empty());

        // 3 + 2 fits exactly
        req.lines[1].quantity = 2.0;
        db.credit_sales().create_credit_sale(&req).await.unwrap();
        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, Some(0.0));
    }

    #[tokio::test]
    async fn test_oversized_principal_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = sample_product("BULK", Unit::Unit, None);
        db.products().insert(&product).await.unwrap();

        let mut req = request(&product.id, InstallmentConfig::new(3, 5.0, date(2026, 1, 1)));
        req.lines[0].quantity = 1e18;
        req.lines.push(req.lines[0].clone());

        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));

        // A single line saturates instead of overflowing and is still too large
        req.lines.truncate(1);
        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert!(db.customers().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inactive_product_cannot_be_sold() {
        let (db, product_id) = setup().await;
        db.products().soft_delete(&product_id).await.unwrap();

        let req = request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 1)));
        let err = db.credit_sales().create_credit_sale(&req).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::ProductInactive(_))));

        let product = db.products().get_by_id(&product_id).await.unwrap().unwrap();
        assert_eq!(product.current_stock, Some(5.0));
    }

    #[tokio::test]
    async fn test_settled_installments_created_paid() {
        let (db, product_id) = setup().await;
        let config = InstallmentConfig::new(3, 0.0, date(2026, 1, 10)).with_current_installment(2);

        let detail = db
            .credit_sales()
            .create_credit_sale(&request(&product_id, config))
            .await
            .unwrap();

        assert_eq!(detail.installments[0].status, InstallmentStatus::Paid);
        assert_eq!(detail.installments[1].status, InstallmentStatus::Pending);
        assert_eq!(detail.customer.pending_balance_cents, 2 * 33_333);

        let today = Utc::now().date_naive();
        assert_eq!(db.cash_register().daily_summary(today).await.unwrap().movement_count, 0);
    }

    #[tokio::test]
    async fn test_pay_installment_updates_balance_and_cash() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales();
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 5.0, date(2026, 1, 15))))
            .await
            .unwrap();

        let receipt = credit
            .pay_installment(&detail.installments[0].id, PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(receipt.movement.amount_cents, 36_721);
        assert_eq!(receipt.movement.credit_sale_id.as_deref(), Some(detail.sale.id.as_str()));
        assert_eq!(receipt.pending_balance.cents(), 2 * 36_721);
        assert_eq!(receipt.paid[0].status, InstallmentStatus::Paid);
        assert_eq!(receipt.paid[0].payment_method, Some(PaymentMethod::Cash));

        // 300.00 × 367.21 / 1101.63 + 50.00 interest
        let expected = Money::from_cents(30_000).scale(36_721.0 / 110_163.0) + Money::from_cents(5_000);
        assert_eq!(receipt.movement.profit_cents, expected.cents());

        let customer = db.customers().get_by_id(&detail.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.pending_balance_cents, 2 * 36_721);

        let today = Utc::now().date_naive();
        let summary = db.cash_register().daily_summary(today).await.unwrap();
        assert_eq!(summary.income.cents(), 36_721);
    }

    #[tokio::test]
    async fn test_paying_twice_fails_and_changes_nothing() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales();
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 15))))
            .await
            .unwrap();
        let first = &detail.installments[0].id;

        credit.pay_installment(first, PaymentMethod::Card).await.unwrap();
        let err = credit.pay_installment(first, PaymentMethod::Card).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::InstallmentAlreadyPaid { number: 1, .. })
        ));

        let movements = db.cash_register().list_by_credit_sale(&detail.sale.id).await.unwrap();
        assert_eq!(movements.len(), 1);

        assert!(matches!(
            credit.pay_installment("missing", PaymentMethod::Cash).await,
            Err(DbError::Core(CoreError::InstallmentNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_pay_all_then_nothing_to_pay() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales();
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 5.0, date(2026, 1, 15))))
            .await
            .unwrap();

        credit
            .pay_installment(&detail.installments[0].id, PaymentMethod::Cash)
            .await
            .unwrap();

        let receipt = credit
            .pay_all_installments(&detail.sale.id, PaymentMethod::Transfer)
            .await
            .unwrap();
        assert_eq!(receipt.paid.len(), 2);
        assert_eq!(receipt.movement.amount_cents, 2 * 36_721);
        assert!(receipt.pending_balance.is_zero());

        // Every cent of the total and all the profit end up in the register
        let movements = db.cash_register().list_by_credit_sale(&detail.sale.id).await.unwrap();
        let collected: i64 = movements.iter().map(|m| m.amount_cents).sum();
        let profit: i64 = movements.iter().map(|m| m.profit_cents).sum();
        assert_eq!(collected, 110_163);
        assert!((profit - (30_000 + 10_163)).abs() <= 3);

        let err = credit
            .pay_all_installments(&detail.sale.id, PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NothingToPay(_))));
    }

    #[tokio::test]
    async fn test_delete_requires_fully_paid() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales();
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 15))))
            .await
            .unwrap();

        credit
            .pay_installment(&detail.installments[0].id, PaymentMethod::Cash)
            .await
            .unwrap();

        let err = credit.delete_credit_sale(&detail.sale.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::PendingInstallmentsRemain { count: 2, .. })
        ));
        assert!(credit.get_by_id(&detail.sale.id).await.unwrap().is_some());

        credit
            .pay_all_installments(&detail.sale.id, PaymentMethod::Cash)
            .await
            .unwrap();
        credit.delete_credit_sale(&detail.sale.id).await.unwrap();

        assert!(credit.get_by_id(&detail.sale.id).await.unwrap().is_none());
        assert!(credit.installments(&detail.sale.id).await.unwrap().is_empty());
        assert!(db
            .cash_register()
            .list_by_credit_sale(&detail.sale.id)
            .await
            .unwrap()
            .is_empty());
        assert!(credit.list_by_customer(&detail.customer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_overdue_is_idempotent() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales();
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 15))))
            .await
            .unwrap();

        // First due 2026-02-15; three days late
        let today = date(2026, 2, 18);
        assert_eq!(credit.refresh_overdue(today).await.unwrap(), 1);
        assert_eq!(credit.refresh_overdue(today).await.unwrap(), 0);

        let installments = credit.installments(&detail.sale.id).await.unwrap();
        assert_eq!(installments[0].status, InstallmentStatus::Overdue);
        assert_eq!(installments[0].days_overdue, 3);
        // 333.33 × 0.05 × 3
        assert_eq!(installments[0].penalty_cents, 5_000);
        assert_eq!(installments[1].status, InstallmentStatus::Pending);

        let due = credit.open_installments_due_by(today).await.unwrap();
        assert_eq!(due.len(), 1);

        // Overdue installments still count towards the balance
        let customer = db.customers().get_by_id(&detail.customer.id).await.unwrap().unwrap();
        assert_eq!(customer.pending_balance_cents, 3 * 33_333);
    }

    #[tokio::test]
    async fn test_refresh_with_configured_rate() {
        let (db, product_id) = setup().await;
        let credit = db.credit_sales().with_penalty_rate(0.01);
        let detail = credit
            .create_credit_sale(&request(&product_id, InstallmentConfig::new(3, 0.0, date(2026, 1, 15))))
            .await
            .unwrap();

        credit.refresh_overdue(date(2026, 2, 20)).await.unwrap();
        let installments = credit.installments(&detail.sale.id).await.unwrap();
        // 333.33 × 0.01 × 5
        assert_eq!(installments[0].penalty_cents, 1_667);
    }

    #[tokio::test]
    async fn test_existing_customer_accumulates_balance() {
        let (db, product_id) = setup().await;
        let customer = db.customers().insert("Bruno", None).await.unwrap();

        let mut req = request(&product_id, InstallmentConfig::new(2, 0.0, date(2026, 1, 1)));
        req.customer = Some(CustomerSelection::Existing(customer.id.clone()));
        db.credit_sales().create_credit_sale(&req).await.unwrap();
        db.credit_sales().create_credit_sale(&req).await.unwrap();

        let customer = db.customers().get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(customer.pending_balance_cents, 200_000);
        assert_eq!(db.credit_sales().list_by_customer(&customer.id).await.unwrap().len(), 2);

        req.customer = Some(CustomerSelection::Existing("missing".to_string()));
        assert!(matches!(
            db.credit_sales().create_credit_sale(&req).await,
            Err(DbError::Core(CoreError::CustomerNotFound(_)))
        ));
    }
}
