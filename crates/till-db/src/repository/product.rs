//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - CRUD operations
//! - Name/SKU lookup
//! - Stock updates in the product's native unit
//!
//! ## Stock in Native Units
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product: Rice, unit = kg, current_stock = 10.0                         │
//! │                                                                         │
//! │  Sale line: 500 g                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  convert_unit(500, g, kg) = 0.5   (caller, till-core)                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  update_stock(id, -0.5)  ──►  current_stock = 9.5                      │
//! │                                                                         │
//! │  current_stock = NULL means "not tracked" and stays NULL               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_sku("RICE-1KG").await?;
/// repo.update_stock(&product.id, -0.5).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products sorted by name.
    ///
    /// An empty `query` lists everything; otherwise the name or SKU must
    /// contain it (case-insensitive).
    pub async fn list_active(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Listing products");

        let pattern = format!("%{}%", query);

        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, unit, price_cents, cost_cents,
                discount_pct, current_stock, is_active, created_at, updated_at
            FROM products
            WHERE is_active = 1
              AND (?1 = '' OR name LIKE ?2 OR sku LIKE ?2)
            ORDER BY name
            LIMIT ?3
            "#,
        )
        .bind(query)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listing returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, sku, name, unit, price_cents, cost_cents,
                discount_pct, current_stock, is_active, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        insert_product(&mut conn, product).await?;
        Ok(product.clone())
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                unit = ?4,
                price_cents = ?5,
                cost_cents = ?6,
                discount_pct = ?7,
                current_stock = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(product.unit)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.discount_pct)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Adds `delta` (native unit) to the product's stock.
    ///
    /// Negative for sales, positive for restocking. Untracked stock stays
    /// untracked.
    pub async fn update_stock(&self, id: &str, delta: f64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        adjust_stock(&mut conn, id, delta).await
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Credit sales keep their figures; only the catalog entry is hidden.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                is_active = 0,
                updated_at = ?2
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (shared with transactional operations)
// =============================================================================

pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, sku, name, unit, price_cents, cost_cents,
            discount_pct, current_stock, is_active, created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

pub(crate) async fn insert_product(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    debug!(sku = %product.sku, unit = %product.unit, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, unit, price_cents, cost_cents,
            discount_pct, current_stock, is_active, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10, ?11
        )
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(product.unit)
    .bind(product.price_cents)
    .bind(product.cost_cents)
    .bind(product.discount_pct)
    .bind(product.current_stock)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::UniqueViolation { field, .. } => DbError::duplicate(field, product.sku.as_str()),
        other => other,
    })?;

    Ok(())
}

pub(crate) async fn adjust_stock(conn: &mut SqliteConnection, id: &str, delta: f64) -> DbResult<()> {
    debug!(id = %id, delta = %delta, "Updating stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            current_stock = current_stock + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
