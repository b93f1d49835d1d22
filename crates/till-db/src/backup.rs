//! # Backup / Export
//!
//! Whole-database JSON snapshots.
//!
//! ## Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  {                                                                      │
//! │    "format_version": 1,                                                 │
//! │    "exported_at": "2026-10-19T18:30:00Z",                              │
//! │    "products":       [...],                                             │
//! │    "customers":      [...],                                             │
//! │    "credit_sales":   [...],                                             │
//! │    "installments":   [...],                                             │
//! │    "cash_movements": [...]                                              │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Import replaces everything in one transaction: a snapshot that fails
//! halfway leaves the database as it was.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::cash_register::insert_movement;
use crate::repository::credit::{insert_installment, insert_sale};
use crate::repository::customer::insert_customer_record;
use crate::repository::product::insert_product;
use till_core::{
    CashMovement, CoreError, CreditSale, Customer, Installment, Product, ValidationError,
};

/// Version written by [`BackupService::export_snapshot`].
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Everything in the database at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub exported_at: DateTime<Utc>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub credit_sales: Vec<CreditSale>,
    pub installments: Vec<Installment>,
    pub cash_movements: Vec<CashMovement>,
}

/// Counts restored by an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub products: usize,
    pub customers: usize,
    pub credit_sales: usize,
    pub installments: usize,
    pub cash_movements: usize,
}

/// Exports and restores snapshots.
#[derive(Debug, Clone)]
pub struct BackupService {
    pool: SqlitePool,
}

impl BackupService {
    /// Creates a new BackupService.
    pub fn new(pool: SqlitePool) -> Self {
        BackupService { pool }
    }

    /// Reads every table, inactive products included.
    pub async fn export_snapshot(&self) -> DbResult<Snapshot> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, unit, price_cents, cost_cents,
                discount_pct, current_stock, is_active, created_at, updated_at
            FROM products
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, pending_balance_cents, created_at, updated_at
            FROM customers
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let credit_sales = sqlx::query_as::<_, CreditSale>(
            r#"
            SELECT
                id, customer_id, principal_cents, interest_rate_pct, installment_count,
                start_date, total_with_interest_cents, product_profit_cents, notes, created_at
            FROM credit_sales
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let installments = sqlx::query_as::<_, Installment>(
            r#"
            SELECT
                id, credit_sale_id, number, due_date, amount_cents, interest_cents,
                penalty_cents, status, days_overdue, paid_at, payment_method
            FROM installments
            ORDER BY credit_sale_id, number
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let cash_movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, kind, amount_cents, profit_cents, description, credit_sale_id, created_at
            FROM cash_movements
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        info!(
            products = products.len(),
            customers = customers.len(),
            credit_sales = credit_sales.len(),
            installments = installments.len(),
            cash_movements = cash_movements.len(),
            "Snapshot exported"
        );

        Ok(Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            exported_at: Utc::now(),
            products,
            customers,
            credit_sales,
            installments,
            cash_movements,
        })
    }

    /// The snapshot as pretty-printed JSON.
    pub async fn export_json(&self) -> DbResult<String> {
        let snapshot = self.export_snapshot().await?;
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replaces the whole database with the snapshot in `json`.
    ///
    /// ## Errors
    /// - `Serialization` - not a snapshot
    /// - `Validation` - unknown `format_version`; nothing is touched
    pub async fn import_json(&self, json: &str) -> DbResult<ImportStats> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        self.import_snapshot(&snapshot).await
    }

    /// Replaces the whole database with `snapshot`.
    pub async fn import_snapshot(&self, snapshot: &Snapshot) -> DbResult<ImportStats> {
        if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(CoreError::from(ValidationError::InvalidFormat {
                field: "format_version".to_string(),
                reason: format!(
                    "expected {}, found {}",
                    SNAPSHOT_FORMAT_VERSION, snapshot.format_version
                ),
            })
            .into());
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        clear_all(&mut tx).await?;

        for product in &snapshot.products {
            insert_product(&mut tx, product).await?;
        }
        for customer in &snapshot.customers {
            insert_customer_record(&mut tx, customer).await?;
        }
        for sale in &snapshot.credit_sales {
            insert_sale(&mut tx, sale).await?;
        }
        for installment in &snapshot.installments {
            insert_installment(&mut tx, installment).await?;
        }
        for movement in &snapshot.cash_movements {
            insert_movement(&mut tx, movement).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let stats = ImportStats {
            products: snapshot.products.len(),
            customers: snapshot.customers.len(),
            credit_sales: snapshot.credit_sales.len(),
            installments: snapshot.installments.len(),
            cash_movements: snapshot.cash_movements.len(),
        };

        info!(?stats, exported_at = %snapshot.exported_at, "Snapshot imported");
        Ok(stats)
    }
}

/// Children before parents, so foreign keys hold at every step.
async fn clear_all(conn: &mut SqliteConnection) -> DbResult<()> {
    for table in [
        "cash_movements",
        "installments",
        "credit_sales",
        "customers",
        "products",
    ] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::credit::{CreditLine, NewCreditSale};
    use crate::repository::product::tests::sample_product;
    use chrono::NaiveDate;
    use till_core::installment::InstallmentConfig;
    use till_core::validation::CustomerSelection;
    use till_core::{Money, PaymentMethod, Unit};

    async fn populated() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = sample_product("FAN-40", Unit::Unit, Some(3.0));
        db.products().insert(&product).await.unwrap();

        let detail = db
            .credit_sales()
            .create_credit_sale(&NewCreditSale {
                customer: Some(CustomerSelection::New("Ana".to_string())),
                lines: vec![CreditLine {
                    product_id: product.id.clone(),
                    quantity: 2.0,
                    unit: Unit::Unit,
                }],
                manual_amount: Money::zero(),
                manual_profit_pct: 0.0,
                config: InstallmentConfig::new(2, 0.0, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
                notes: Some("Two fans".to_string()),
            })
            .await
            .unwrap();

        db.credit_sales()
            .pay_installment(&detail.installments[0].id, PaymentMethod::Cash)
            .await
            .unwrap();

        db
    }

    #[tokio::test]
    async fn test_export_contains_everything() {
        let db = populated().await;
        let snapshot = db.backup().export_snapshot().await.unwrap();

        assert_eq!(snapshot.format_version, SNAPSHOT_FORMAT_VERSION);
        assert_eq!(snapshot.products.len(), 1);
        assert_eq!(snapshot.customers.len(), 1);
        assert_eq!(snapshot.credit_sales.len(), 1);
        assert_eq!(snapshot.installments.len(), 2);
        assert_eq!(snapshot.cash_movements.len(), 1);
    }

    #[tokio::test]
    async fn test_json_restores_into_empty_database() {
        let source = populated().await;
        let json = source.backup().export_json().await.unwrap();

        let target = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = target.backup().import_json(&json).await.unwrap();
        assert_eq!(stats.installments, 2);

        let customers = target.customers().list().await.unwrap();
        assert_eq!(customers.len(), 1);
        // 2 × 2.50 over 2 installments, one paid
        assert_eq!(customers[0].pending_balance_cents, 250);

        let sales = target.credit_sales().list_by_customer(&customers[0].id).await.unwrap();
        assert_eq!(sales[0].notes.as_deref(), Some("Two fans"));
    }

    #[tokio::test]
    async fn test_import_replaces_existing_content() {
        let db = populated().await;
        let json = db.backup().export_json().await.unwrap();

        db.customers().insert("Extra", None).await.unwrap();
        db.backup().import_json(&json).await.unwrap();

        assert_eq!(db.customers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_version_rejected_without_changes() {
        let db = populated().await;
        let mut snapshot = db.backup().export_snapshot().await.unwrap();
        snapshot.format_version = 99;
        snapshot.customers.clear();

        let json = serde_json::to_string(&snapshot).unwrap();
        let err = db.backup().import_json(&json).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
        assert_eq!(db.customers().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_garbage_is_a_serialization_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.backup().import_json("{ not json").await.unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }
}
