//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Lookup by id or SKU (the cashier scans or types the SKU)
//! - Search on name or SKU
//! - Edit and restock from the admin screens
//! - Conditional stock moves used inside checkout and return transactions
//!
//! ## Stock Moves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Why the decrement is conditional                     │
//! │                                                                         │
//! │  Checkout A: 3 × A1        Checkout B: 3 × A1        stock(A1) = 5      │
//! │       │                         │                                       │
//! │       ▼                         │                                       │
//! │  UPDATE ... SET stock = stock - 3 WHERE id = A1 AND stock >= 3          │
//! │       │  1 row → stock 2        │                                       │
//! │       │                         ▼                                       │
//! │       │                    same UPDATE: 0 rows (2 < 3)                  │
//! │       │                         │                                       │
//! │       ▼                         ▼                                       │
//! │     COMMIT               InsufficientStock → ROLLBACK                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::contains_pattern;
use ferre_core::validation::{
    validate_price_cents, validate_required, validate_search_query, validate_sku, validate_stock,
};
use ferre_core::{CoreError, Product};

const PRODUCT_COLUMNS: &str = "id, sku, name, price_cents, cost_cents, stock, low_stock_threshold, \
     category_id, supplier_id, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Cashier scan
/// let hammer = repo.get_by_sku("A1").await?;
///
/// // Admin restock
/// repo.update_stock(&hammer.id, 40, 5).await?;
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

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id(&mut conn, id).await
    }

    /// Gets a product by SKU (exact match, surrounding whitespace ignored).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE sku = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Searches products by name or SKU, ordered by name.
    ///
    /// An empty query lists the catalog.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE name LIKE ?1 ESCAPE '\' OR sku LIKE ?1 ESCAPE '\'
            ORDER BY name
            LIMIT ?2
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(contains_pattern(&query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY name LIMIT ?1",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Every product, grouped later by supplier for the inventory report.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products ORDER BY supplier_id, name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// - `Domain(Validation)` for a malformed SKU, blank name or negative amounts
    /// - `UniqueViolation` if the SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;

        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, price_cents, cost_cents, stock, low_stock_threshold,
                category_id, supplier_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(product.sku.trim())
        .bind(product.name.trim())
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock)
        .bind(product.low_stock_threshold)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_sku(e, &product.sku))?;

        Ok(())
    }

    /// Updates the descriptive fields of a product.
    ///
    /// Stock is left alone: it only moves through sales, returns and
    /// [`update_stock`](Self::update_stock).
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        validate_product(product)?;

        debug!(id = %product.id, sku = %product.sku, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET
                sku = ?2,
                name = ?3,
                price_cents = ?4,
                cost_cents = ?5,
                low_stock_threshold = ?6,
                category_id = ?7,
                supplier_id = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(product.sku.trim())
        .bind(product.name.trim())
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.low_stock_threshold)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| unique_sku(e, &product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        self.get_by_id(&product.id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Sets the stock level and alert threshold (admin restock).
    pub async fn update_stock(
        &self,
        id: &str,
        stock: i64,
        low_stock_threshold: i64,
    ) -> DbResult<Product> {
        validate_stock(stock)?;
        validate_stock(low_stock_threshold)?;

        debug!(id = %id, stock, low_stock_threshold, "Restocking product");

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = ?2, low_stock_threshold = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(stock)
        .bind(low_stock_threshold)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Products at or below their low-stock threshold, emptiest first.
    pub async fn low_stock(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM products
            WHERE stock <= low_stock_threshold
            ORDER BY stock, name
            LIMIT ?1
            "#,
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn fetch_by_id(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Takes `quantity` units out of stock, or fails without touching the row.
///
/// ## Errors
/// - `ProductNotFound` if the product vanished
/// - `InsufficientStock` if fewer than `quantity` units remain
pub(crate) async fn take_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        return Ok(());
    }

    match fetch_by_id(conn, product_id).await? {
        None => Err(CoreError::ProductNotFound(product_id.to_string()).into()),
        Some(product) => Err(CoreError::InsufficientStock {
            sku: product.sku,
            name: product.name,
            available: product.stock,
            requested: quantity,
        }
        .into()),
    }
}

/// Puts returned units back on the shelf.
pub(crate) async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(product_id)
    .bind(quantity)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }

    Ok(())
}

fn validate_product(product: &Product) -> DbResult<()> {
    validate_sku(&product.sku)?;
    validate_required("name", &product.name, 200)?;
    validate_price_cents("price", product.price_cents)?;
    if let Some(cost) = product.cost_cents {
        validate_price_cents("cost", cost)?;
    }
    validate_stock(product.stock)?;
    validate_stock(product.low_stock_threshold)?;
    Ok(())
}

fn unique_sku(err: sqlx::Error, sku: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("sku", sku.trim()),
        other => other,
    }
}
