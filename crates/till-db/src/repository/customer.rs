//! # Customer Repository
//!
//! Customers who buy on credit, and their pending balance.
//!
//! ## Pending Balance
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  customers.pending_balance_cents                                        │
//! │        =                                                                │
//! │  SUM(installments.amount_cents)                                         │
//! │    WHERE status IN ('pending', 'overdue')                               │
//! │      AND credit sale belongs to the customer                            │
//! │                                                                         │
//! │  Stored (denormalized) for cheap listing, recomputed from the          │
//! │  installments inside every transaction that changes them.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::validation::validate_customer_name;
use till_core::{CoreError, Customer, Money};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer with a zero balance.
    pub async fn insert(&self, name: &str, phone: Option<&str>) -> DbResult<Customer> {
        let mut conn = self.pool.acquire().await?;
        insert_customer(&mut conn, name, phone).await
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        fetch_customer(&mut conn, id).await
    }

    /// Lists customers by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, pending_balance_cents, created_at, updated_at
            FROM customers
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Lists customers that still owe something, largest balance first.
    pub async fn list_with_balance(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, phone, pending_balance_cents, created_at, updated_at
            FROM customers
            WHERE pending_balance_cents > 0
            ORDER BY pending_balance_cents DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Recomputes and stores the customer's pending balance.
    ///
    /// ## Returns
    /// The new balance.
    pub async fn recompute_pending_balance(&self, customer_id: &str) -> DbResult<Money> {
        let mut conn = self.pool.acquire().await?;
        recompute_pending_balance(&mut conn, customer_id).await
    }
}

// =============================================================================
// Connection-level helpers (shared with transactional operations)
// =============================================================================

pub(crate) async fn insert_customer(
    conn: &mut SqliteConnection,
    name: &str,
    phone: Option<&str>,
) -> DbResult<Customer> {
    validate_customer_name(name).map_err(CoreError::from)?;

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: name.trim().to_string(),
        phone: phone.map(str::trim).filter(|p| !p.is_empty()).map(String::from),
        pending_balance_cents: 0,
        created_at: now,
        updated_at: now,
    };

    insert_customer_record(conn, &customer).await?;
    Ok(customer)
}

pub(crate) async fn insert_customer_record(
    conn: &mut SqliteConnection,
    customer: &Customer,
) -> DbResult<()> {
    debug!(id = %customer.id, name = %customer.name, "Inserting customer");

    sqlx::query(
        r#"
        INSERT INTO customers (id, name, phone, pending_balance_cents, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&customer.id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(customer.pending_balance_cents)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, phone, pending_balance_cents, created_at, updated_at
        FROM customers
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(customer)
}

pub(crate) async fn recompute_pending_balance(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> DbResult<Money> {
    let pending: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(i.amount_cents), 0)
        FROM installments i
        INNER JOIN credit_sales cs ON cs.id = i.credit_sale_id
        WHERE cs.customer_id = ?1
          AND i.status IN ('pending', 'overdue')
        "#,
    )
    .bind(customer_id)
    .fetch_one(&mut *conn)
    .await?;

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET pending_balance_cents = ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(pending)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    debug!(customer_id = %customer_id, pending_cents = pending, "Pending balance recomputed");
    Ok(Money::from_cents(pending))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn repo() -> CustomerRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.customers()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let customer = repo.insert("  Ana Souza ", Some("555-0101")).await.unwrap();

        assert_eq!(customer.name, "Ana Souza");
        assert!(customer.pending_balance().is_zero());

        let stored = repo.get_by_id(&customer.id).await.unwrap().unwrap();
        assert_eq!(stored.id, customer.id);
        assert_eq!(stored.phone.as_deref(), Some("555-0101"));
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let repo = repo().await;
        let err = repo.insert("   ", None).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let repo = repo().await;
        repo.insert("Carla", None).await.unwrap();
        repo.insert("Bruno", Some("  ")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bruno", "Carla"]);
        assert!(repo.list_with_balance().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recompute_without_sales_is_zero() {
        let repo = repo().await;
        let customer = repo.insert("Dora", None).await.unwrap();
        assert!(repo.recompute_pending_balance(&customer.id).await.unwrap().is_zero());

        assert!(matches!(
            repo.recompute_pending_balance("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
