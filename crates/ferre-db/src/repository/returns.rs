//! # Return Repository
//!
//! Processes customer returns against recorded sales.
//!
//! ## Return Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Return (one transaction)                            │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │   1. load original sale (not a compensation) and its items             │
//! │   2. Σ previously returned quantity per sale item                      │
//! │   3. plan_return(): cap per item, no negatives, at least one line      │
//! │   4. actor's open session (required)                                   │
//! │   5. INSERT compensating sale                                          │
//! │        total = −refund, method = return, session = ORIGINAL session    │
//! │   6. INSERT sale_returns + sale_return_items                           │
//! │   7. stock += returned quantity, per line                              │
//! │   8. original paid cash → actor's session accumulated_cash −= refund   │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error rolls the whole return back: no stock, ledger or sale rows move.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::product::restore_stock;
use crate::repository::sale::{fetch_items, fetch_sale, insert_sale, no_active_session, SALE_COLUMNS};
use crate::repository::session::{active_in, adjust_cash};
use crate::repository::{generate_id, prefix_pattern};
use ferre_core::validation::{optional_text, validate_search_query};
use ferre_core::{
    plan_return, returnable_items, CoreError, PaymentMethod, ReturnReceipt, ReturnRequest,
    ReturnableSale, Sale, SaleReturn, SaleReturnItem, ValidationError,
};

const MAX_MOTIVE_LEN: usize = 500;

/// Repository for returns.
#[derive(Debug, Clone)]
pub struct ReturnRepository {
    pool: SqlitePool,
}

impl ReturnRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReturnRepository { pool }
    }

    /// Processes a return of some items of `sale_id`.
    ///
    /// ## Arguments
    /// * `sale_id` - The original sale
    /// * `requests` - Quantity to return per original sale item (0 skips the item)
    /// * `motive` - Free-text reason, may be blank
    /// * `actor_id` - The user processing the return; needs an open session
    ///
    /// ## Errors
    /// - `SaleNotFound`
    /// - `Domain(Validation)`: compensation sale, negative or excessive
    ///   quantity, unknown sale item, nothing to return
    /// - `NoActiveSession` for the actor
    pub async fn process_return(
        &self,
        sale_id: &str,
        requests: &[ReturnRequest],
        motive: &str,
        actor_id: &str,
    ) -> DbResult<ReturnReceipt> {
        let motive = optional_text("motive", Some(motive), MAX_MOTIVE_LEN)?.unwrap_or_default();

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale(&mut tx, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        if sale.is_compensation() {
            return Err(ValidationError::NotReturnable {
                sale_id: sale_id.to_string(),
            }
            .into());
        }

        let items = fetch_items(&mut tx, sale_id).await?;
        let returned = already_returned(&mut tx, sale_id).await?;
        let plan = plan_return(&items, &returned, requests)?;

        let session = active_in(&mut tx, actor_id)
            .await?
            .ok_or_else(|| no_active_session(actor_id))?;

        let now = Utc::now();
        let refund = plan.total_refund();

        debug!(
            sale_id = %sale_id,
            lines = plan.lines.len(),
            refund = %refund,
            "Processing return"
        );

        let compensating_sale = Sale {
            id: generate_id(),
            session_id: sale.session_id.clone(),
            seller_id: actor_id.to_string(),
            client_id: sale.client_id.clone(),
            payment_method: PaymentMethod::Return,
            total_cents: (-refund).cents(),
            sale_date: now,
        };
        insert_sale(&mut tx, &compensating_sale).await?;

        let sale_return = SaleReturn {
            id: generate_id(),
            sale_id: sale.id.clone(),
            processed_by: actor_id.to_string(),
            motive,
            total_refund_cents: refund.cents(),
            compensating_sale_id: compensating_sale.id.clone(),
            return_date: now,
        };
        sqlx::query(
            r#"
            INSERT INTO sale_returns (
                id, sale_id, processed_by, motive,
                total_refund_cents, compensating_sale_id, return_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&sale_return.id)
        .bind(&sale_return.sale_id)
        .bind(&sale_return.processed_by)
        .bind(&sale_return.motive)
        .bind(sale_return.total_refund_cents)
        .bind(&sale_return.compensating_sale_id)
        .bind(sale_return.return_date)
        .execute(&mut *tx)
        .await?;

        let mut return_items = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let item = SaleReturnItem {
                id: generate_id(),
                return_id: sale_return.id.clone(),
                sale_item_id: line.sale_item_id.clone(),
                product_id: line.product_id.clone(),
                quantity: line.quantity,
                refund_cents: line.refund_cents,
            };
            sqlx::query(
                r#"
                INSERT INTO sale_return_items (
                    id, return_id, sale_item_id, product_id, quantity, refund_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.return_id)
            .bind(&item.sale_item_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.refund_cents)
            .execute(&mut *tx)
            .await?;

            restore_stock(&mut tx, &line.product_id, line.quantity).await?;
            return_items.push(item);
        }

        if sale.payment_method == PaymentMethod::Cash {
            adjust_cash(&mut tx, &session.id, -refund).await?;
        }

        tx.commit().await?;

        info!(
            return_id = %sale_return.id,
            sale_id = %sale_id,
            compensating_sale_id = %compensating_sale.id,
            refund = %refund,
            "Return processed"
        );

        Ok(ReturnReceipt {
            sale_return,
            items: return_items,
            compensating_sale,
        })
    }

    /// A sale with, per item, how much was already returned and what remains.
    pub async fn returnable(&self, sale_id: &str) -> DbResult<ReturnableSale> {
        let mut conn = self.pool.acquire().await?;

        let sale = fetch_sale(&mut conn, sale_id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;
        if sale.is_compensation() {
            return Err(ValidationError::NotReturnable {
                sale_id: sale_id.to_string(),
            }
            .into());
        }

        returnable_sale(&mut conn, sale).await
    }

    /// Finds regular sales whose id starts with `query`, newest first.
    ///
    /// Backs the return-search screen, where the cashier types the first
    /// characters of the receipt's sale id.
    pub async fn search_returnable(&self, query: &str, limit: u32) -> DbResult<Vec<ReturnableSale>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            r#"
            SELECT {}
            FROM sales
            WHERE id LIKE ?1 ESCAPE '\' AND payment_method != 'return'
            ORDER BY sale_date DESC
            LIMIT ?2
            "#,
            SALE_COLUMNS
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(prefix_pattern(&query))
            .bind(limit)
            .fetch_all(&mut *conn)
            .await?;

        let mut found = Vec::with_capacity(sales.len());
        for sale in sales {
            found.push(returnable_sale(&mut conn, sale).await?);
        }

        Ok(found)
    }

    /// Returns already processed against a sale, oldest first.
    pub async fn list_for_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        let returns = sqlx::query_as::<_, SaleReturn>(
            r#"
            SELECT id, sale_id, processed_by, motive,
                   total_refund_cents, compensating_sale_id, return_date
            FROM sale_returns
            WHERE sale_id = ?1
            ORDER BY return_date
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(returns)
    }

    /// Items of one processed return.
    pub async fn get_items(&self, return_id: &str) -> DbResult<Vec<SaleReturnItem>> {
        let items = sqlx::query_as::<_, SaleReturnItem>(
            r#"
            SELECT id, return_id, sale_item_id, product_id, quantity, refund_cents
            FROM sale_return_items
            WHERE return_id = ?1
            "#,
        )
        .bind(return_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}

/// Units already returned per sale item, across every return of the sale.
async fn already_returned(
    conn: &mut SqliteConnection,
    sale_id: &str,
) -> DbResult<HashMap<String, i64>> {
    let rows: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT sri.sale_item_id, SUM(sri.quantity)
        FROM sale_return_items sri
        JOIN sale_returns sr ON sr.id = sri.return_id
        WHERE sr.sale_id = ?1
        GROUP BY sri.sale_item_id
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().collect())
}

async fn returnable_sale(conn: &mut SqliteConnection, sale: Sale) -> DbResult<ReturnableSale> {
    let items = fetch_items(conn, &sale.id).await?;
    let returned = already_returned(conn, &sale.id).await?;

    Ok(ReturnableSale {
        items: returnable_items(items, &returned),
        sale,
    })
}
