//! # Sale Repository
//!
//! Sales, sale items and the checkout transaction.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout (one transaction)                        │
//! │                                                                         │
//! │  pre-checks: payment method ∈ {cash, card}, cart not empty,            │
//! │              open session for the seller, client exists                │
//! │       │                                                                 │
//! │  BEGIN                                                                 │
//! │   1. per cart line: UPDATE products SET stock = stock - qty            │
//! │                     WHERE id = ? AND stock >= qty                      │
//! │        └── 0 rows → InsufficientStock → ROLLBACK (nothing written)     │
//! │   2. INSERT sales (total = Σ line subtotals)                           │
//! │   3. INSERT sale_items (name, sku, unit price frozen from the cart)    │
//! │   4. cash only: session.accumulated_cash += total                      │
//! │   5. DELETE carts WHERE user_id = seller                               │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales are immutable once committed. Returns add compensating rows; see
//! [`super::returns`].

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::cart::{delete_in, load_in};
use crate::repository::generate_id;
use crate::repository::product::take_stock;
use crate::repository::session::{active_in, adjust_cash};
use ferre_core::{CoreError, PaymentMethod, Sale, SaleItem, SaleWithItems, ValidationError};

pub(crate) const SALE_COLUMNS: &str =
    "id, session_id, seller_id, client_id, payment_method, total_cents, sale_date";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, sku, quantity, unit_price_cents, subtotal_cents";

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Turns the seller's cart into a sale.
    ///
    /// ## Arguments
    /// * `seller_id` - The cashier; their cart is sold and their open session is credited
    /// * `payment_method` - Cash or card
    /// * `client_id` - Optional customer
    ///
    /// ## Errors
    /// - `Domain(Validation)` for the `return` payment method
    /// - `EmptyCart`
    /// - `NoActiveSession` when the seller has no open till
    /// - `NotFound` for an unknown client
    /// - `InsufficientStock` naming the first product that ran short
    ///
    /// On any error nothing is written and the cart is left as it was.
    pub async fn checkout(
        &self,
        seller_id: &str,
        payment_method: PaymentMethod,
        client_id: Option<&str>,
    ) -> DbResult<SaleWithItems> {
        if payment_method == PaymentMethod::Return {
            return Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }
            .into());
        }

        // Cart read and cart delete share this transaction.
        let mut tx = self.pool.begin().await?;

        let cart = load_in(&mut tx, seller_id).await?;
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let session = active_in(&mut tx, seller_id)
            .await?
            .ok_or_else(|| no_active_session(seller_id))?;

        if let Some(client_id) = client_id {
            let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM clients WHERE id = ?1")
                .bind(client_id)
                .fetch_optional(&mut *tx)
                .await?;
            if exists.is_none() {
                return Err(DbError::not_found("Client", client_id));
            }
        }

        debug!(
            seller_id = %seller_id,
            lines = cart.item_count(),
            total = %cart.total(),
            method = %payment_method,
            "Starting checkout"
        );

        for line in cart.lines() {
            if let Err(e) = take_stock(&mut tx, &line.product_id, line.quantity).await {
                warn!(sku = %line.sku, requested = line.quantity, error = %e, "Checkout aborted");
                return Err(e);
            }
        }

        let sale = Sale {
            id: generate_id(),
            session_id: session.id.clone(),
            seller_id: seller_id.to_string(),
            client_id: client_id.map(str::to_string),
            payment_method,
            total_cents: cart.total().cents(),
            sale_date: Utc::now(),
        };
        insert_sale(&mut tx, &sale).await?;

        let mut items = Vec::with_capacity(cart.item_count());
        for line in cart.lines() {
            let item = SaleItem {
                id: generate_id(),
                sale_id: sale.id.clone(),
                product_id: line.product_id.clone(),
                product_name: line.name.clone(),
                sku: line.sku.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                subtotal_cents: line.subtotal_cents,
            };
            insert_item(&mut tx, &item).await?;
            items.push(item);
        }

        if payment_method == PaymentMethod::Cash {
            adjust_cash(&mut tx, &session.id, sale.total()).await?;
        }

        delete_in(&mut tx, seller_id).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            session_id = %sale.session_id,
            total = %sale.total(),
            method = %payment_method,
            items = items.len(),
            "Sale completed"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;
        fetch_sale(&mut conn, id).await
    }

    /// Gets a sale with its items.
    pub async fn get_with_items(&self, id: &str) -> DbResult<SaleWithItems> {
        let mut conn = self.pool.acquire().await?;
        let sale = fetch_sale(&mut conn, id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;
        let items = fetch_items(&mut conn, id).await?;

        Ok(SaleWithItems { sale, items })
    }

    /// Gets all items for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let mut conn = self.pool.acquire().await?;
        fetch_items(&mut conn, sale_id).await
    }

    /// Sales recorded against a session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales WHERE session_id = ?1 ORDER BY sale_date",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(session_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Sales in `[from, to)`, oldest first. Compensating sales included.
    pub async fn list_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<Vec<Sale>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2
            ORDER BY sale_date
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Most recent sales, newest first.
    pub async fn recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {} FROM sales ORDER BY sale_date DESC LIMIT ?1",
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

pub(crate) fn no_active_session(user_id: &str) -> DbError {
    DbError::Domain(CoreError::NoActiveSession {
        user_id: user_id.to_string(),
    })
}

pub(crate) async fn fetch_sale(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Sale>> {
    let sql = format!("SELECT {} FROM sales WHERE id = ?1", SALE_COLUMNS);
    let sale = sqlx::query_as::<_, Sale>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(sale)
}

pub(crate) async fn fetch_items(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
    let sql = format!(
        "SELECT {} FROM sale_items WHERE sale_id = ?1 ORDER BY product_name, id",
        ITEM_COLUMNS
    );
    let items = sqlx::query_as::<_, SaleItem>(&sql)
        .bind(sale_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, total_cents = sale.total_cents, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, session_id, seller_id, client_id, payment_method, total_cents, sale_date
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.session_id)
    .bind(&sale.seller_id)
    .bind(&sale.client_id)
    .bind(sale.payment_method)
    .bind(sale.total_cents)
    .bind(sale.sale_date)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_name, sku,
            quantity, unit_price_cents, subtotal_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(&item.sku)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{cashier, stocked_product, test_db};
    use ferre_core::Money;

    #[tokio::test]
    async fn test_cash_checkout_scenario() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(10_000))
            .await
            .unwrap();
        let hammer = stocked_product(&db, "A1", Money::from_cents(1000), 5).await;

        for _ in 0..3 {
            db.carts().add_by_sku(&user.id, "A1", 1).await.unwrap();
        }

        let receipt = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        assert_eq!(receipt.sale.total(), Money::from_cents(3000));
        assert_eq!(receipt.sale.session_id, session.id);
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].quantity, 3);
        assert_eq!(receipt.items[0].sku, "A1");

        let stock = db.products().get_by_id(&hammer.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);

        let session = db.sessions().require(&session.id).await.unwrap();
        assert_eq!(session.ledger_balance(), Money::from_cents(13_000));
        assert_eq!(
            db.sessions().expected_cash_balance(&session.id).await.unwrap(),
            Money::from_cents(3000)
        );

        assert!(db.carts().load(&user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_aborts_everything() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(10_000))
            .await
            .unwrap();
        let hammer = stocked_product(&db, "A1", Money::from_cents(1000), 5).await;
        let saw = stocked_product(&db, "B1", Money::from_cents(2000), 5).await;

        db.carts().add_product(&user.id, &saw.id, 2).await.unwrap();
        db.carts().add_product(&user.id, &hammer.id, 5).await.unwrap();
        // Stock drops after the items went into the cart.
        db.products().update_stock(&hammer.id, 4, 5).await.unwrap();

        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 4, requested: 5, .. })
        ));

        assert_eq!(db.products().get_by_id(&saw.id).await.unwrap().unwrap().stock, 5);
        assert_eq!(db.products().get_by_id(&hammer.id).await.unwrap().unwrap().stock, 4);
        assert!(db.sales().list_for_session(&session.id).await.unwrap().is_empty());
        assert_eq!(db.carts().load(&user.id).await.unwrap().item_count(), 2);

        let session = db.sessions().require(&session.id).await.unwrap();
        assert_eq!(session.accumulated_cash_cents, 0);
    }

    #[tokio::test]
    async fn test_cart_quantity_above_stock_is_rejected() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        db.sessions().open(&user.id, Money::zero()).await.unwrap();
        let hammer = stocked_product(&db, "A1", Money::from_cents(1000), 5).await;

        // A cart saved before a restock went the other way.
        let mut cart = ferre_core::Cart::new();
        let mut plenty = hammer.clone();
        plenty.stock = 10;
        cart.add_product(&plenty, 6).unwrap();
        db.carts().save(&user.id, &cart).await.unwrap();

        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Card, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientStock { .. })));
        assert_eq!(db.products().get_by_id(&hammer.id).await.unwrap().unwrap().stock, 5);
        assert!(db.sales().recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_card_sale_does_not_touch_drawer() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db
            .sessions()
            .open(&user.id, Money::from_cents(5_000))
            .await
            .unwrap();
        stocked_product(&db, "A1", Money::from_cents(1250), 5).await;
        stocked_product(&db, "B1", Money::from_cents(399), 5).await;
        db.carts().add_by_sku(&user.id, "A1", 2).await.unwrap();
        db.carts().add_by_sku(&user.id, "B1", 3).await.unwrap();

        let receipt = db
            .sales()
            .checkout(&user.id, PaymentMethod::Card, None)
            .await
            .unwrap();

        let item_total: i64 = receipt.items.iter().map(|i| i.subtotal_cents).sum();
        assert_eq!(receipt.items.len(), 2);
        assert_eq!(item_total, receipt.sale.total_cents);
        assert_eq!(receipt.sale.total_cents, 2 * 1250 + 3 * 399);

        let stored = db.sales().get_with_items(&receipt.sale.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);

        let session = db.sessions().require(&session.id).await.unwrap();
        assert_eq!(session.accumulated_cash_cents, 0);
    }

    #[tokio::test]
    async fn test_checkout_preconditions() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        stocked_product(&db, "A1", Money::from_cents(1000), 5).await;

        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptyCart)));

        db.carts().add_by_sku(&user.id, "A1", 1).await.unwrap();
        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NoActiveSession { .. })));

        db.sessions().open(&user.id, Money::zero()).await.unwrap();
        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Return, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let err = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, Some("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert_eq!(db.carts().load(&user.id).await.unwrap().item_count(), 1);
    }

    #[tokio::test]
    async fn test_line_added_during_checkout_is_sold_or_kept() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        db.sessions().open(&user.id, Money::zero()).await.unwrap();
        stocked_product(&db, "A1", Money::from_cents(1000), 10).await;
        stocked_product(&db, "B2", Money::from_cents(500), 10).await;
        db.carts().add_by_sku(&user.id, "A1", 3).await.unwrap();

        let sales = db.sales();
        let carts = db.carts();
        let (receipt, added) = tokio::join!(
            sales.checkout(&user.id, PaymentMethod::Card, None),
            carts.add_by_sku(&user.id, "B2", 1),
        );
        let receipt = receipt.unwrap();
        added.unwrap();

        let sold: i64 = receipt.items.iter().map(|i| i.quantity).sum();
        let left = db.carts().load(&user.id).await.unwrap().total_quantity();
        assert_eq!(sold + left, 4);
    }

    #[tokio::test]
    async fn test_snapshot_survives_product_edit() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        db.sessions().open(&user.id, Money::zero()).await.unwrap();
        let mut hammer = stocked_product(&db, "A1", Money::from_cents(1000), 5).await;
        db.carts().add_by_sku(&user.id, "A1", 1).await.unwrap();
        let receipt = db
            .sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        hammer.name = "Renamed".to_string();
        hammer.price_cents = 9999;
        db.products().update(&hammer).await.unwrap();

        let items = db.sales().get_items(&receipt.sale.id).await.unwrap();
        assert_eq!(items[0].product_name, "Product A1");
        assert_eq!(items[0].unit_price_cents, 1000);
    }

    #[tokio::test]
    async fn test_session_with_sales_cannot_be_deleted() {
        let db = test_db().await;
        let user = cashier(&db, "ana").await;
        let session = db.sessions().open(&user.id, Money::zero()).await.unwrap();
        stocked_product(&db, "A1", Money::from_cents(1000), 5).await;
        db.carts().add_by_sku(&user.id, "A1", 1).await.unwrap();
        db.sales()
            .checkout(&user.id, PaymentMethod::Cash, None)
            .await
            .unwrap();

        let err = db.sessions().delete(&session.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::SessionHasSales { .. })));
    }
}
