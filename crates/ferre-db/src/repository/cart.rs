//! # Cart Repository
//!
//! Persists each user's [`Cart`] as a JSON payload keyed by user id.
//!
//! ## Cart Lifecycle
//! ```text
//! add_by_sku ──► BEGIN ─ load ─ Cart::add_product ─ save (upsert) ─ COMMIT
//!
//! checkout ───► BEGIN ─ load ... sale ... DELETE ─ COMMIT
//! ```
//!
//! A missing row is an empty cart, so callers never have to create one.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::fetch_by_id;
use ferre_core::{Cart, CoreError};

/// Repository for the per-user cart store.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads the user's cart. Empty when nothing was saved yet.
    pub async fn load(&self, user_id: &str) -> DbResult<Cart> {
        let mut conn = self.pool.acquire().await?;
        load_in(&mut conn, user_id).await
    }

    /// Saves the cart, replacing any previous payload.
    pub async fn save(&self, user_id: &str, cart: &Cart) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        save_in(&mut conn, user_id, cart).await
    }

    /// Empties the user's cart.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        debug!(user_id = %user_id, "Clearing cart");

        let mut conn = self.pool.acquire().await?;
        delete_in(&mut conn, user_id).await
    }

    /// Adds `quantity` units of the product with this SKU to the user's cart.
    ///
    /// ## Errors
    /// - `ProductNotFound` for an unknown SKU
    /// - `InsufficientStock` when the cart would hold more than the shelf
    /// - `CartTooLarge` / `QuantityTooLarge` past the cart limits
    pub async fn add_by_sku(&self, user_id: &str, sku: &str, quantity: i64) -> DbResult<Cart> {
        let sku = sku.trim();
        let product = sqlx::query_scalar::<_, String>("SELECT id FROM products WHERE sku = ?1")
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(sku.to_string()))?;

        self.add_product(user_id, &product, quantity).await
    }

    /// Adds `quantity` units of a product, by id, to the user's cart.
    pub async fn add_product(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<Cart> {
        let mut tx = self.pool.begin().await?;
        let product = fetch_by_id(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let mut cart = load_in(&mut tx, user_id).await?;
        let line = cart.add_product(&product, quantity)?;
        debug!(
            user_id = %user_id,
            sku = %line.sku,
            quantity = line.quantity,
            "Added product to cart"
        );

        save_in(&mut tx, user_id, &cart).await?;
        tx.commit().await?;
        Ok(cart)
    }

    /// Removes a product line from the user's cart.
    ///
    /// Removing a product that is not in the cart is a `ProductNotFound`.
    pub async fn remove_product(&self, user_id: &str, product_id: &str) -> DbResult<Cart> {
        let mut tx = self.pool.begin().await?;
        let mut cart = load_in(&mut tx, user_id).await?;

        if cart.remove_product(product_id).is_none() {
            return Err(CoreError::ProductNotFound(product_id.to_string()).into());
        }

        debug!(user_id = %user_id, product_id = %product_id, "Removed product from cart");

        save_in(&mut tx, user_id, &cart).await?;
        tx.commit().await?;
        Ok(cart)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) async fn load_in(conn: &mut SqliteConnection, user_id: &str) -> DbResult<Cart> {
    let payload: Option<String> =
        sqlx::query_scalar("SELECT payload FROM carts WHERE user_id = ?1")
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

    match payload {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(Cart::new()),
    }
}

async fn save_in(conn: &mut SqliteConnection, user_id: &str, cart: &Cart) -> DbResult<()> {
    let payload = serde_json::to_string(cart)?;

    debug!(user_id = %user_id, lines = cart.item_count(), "Saving cart");

    sqlx::query(
        r#"
        INSERT INTO carts (user_id, payload, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(user_id) DO UPDATE SET
            payload = excluded.payload,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(payload)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| match DbError::from(e) {
        DbError::ForeignKeyViolation { .. } => DbError::not_found("User", user_id),
        other => other,
    })?;

    Ok(())
}

pub(crate) async fn delete_in(conn: &mut SqliteConnection, user_id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM carts WHERE user_id = ?1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
