//! # Report Repository
//!
//! Read-only aggregation over sales and the catalog.
//!
//! ```text
//! daily_summary ─┐
//! top_products  ─┼──► dashboard
//! low_stock     ─┘
//! monthly       ──► Vec<MonthlySummary>    (grouped on substr(sale_date, 1, 7))
//! sales_report  ──► SalesReport            (cash / card / refund breakdown)
//! supplier_inventory ──► Vec<SupplierInventory>
//! ```
//!
//! Date windows are half-open `[from, to)` in UTC. Compensating sales are
//! counted as refunds, never as sales.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use ferre_core::{
    DailySummary, Dashboard, MonthlySummary, Product, SalesReport, SupplierInventory, TopProduct,
    ValidationError,
};

/// Days of sales the dashboard ranks top products over.
const DASHBOARD_WINDOW_DAYS: i64 = 30;

/// Repository for reports.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Gross sales, refunds, net, count and average ticket for one UTC day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        let (from, to) = day_bounds(date)?;

        let (gross, count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2 AND payment_method != 'return'
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let refunds: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(-SUM(total_cents), 0)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2 AND payment_method = 'return'
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(DailySummary::new(date, gross, refunds, count))
    }

    /// Best sellers by units sold in `[from, to)`.
    ///
    /// Units later returned still count as sold.
    pub async fn top_products(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        limit: u32,
    ) -> DbResult<Vec<TopProduct>> {
        debug!(%from, %to, limit, "Ranking top products");

        let top = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                si.product_id AS product_id,
                p.name AS product_name,
                SUM(si.quantity) AS quantity_sold,
                SUM(si.subtotal_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.sale_date >= ?1 AND s.sale_date < ?2
            GROUP BY si.product_id, p.name
            ORDER BY quantity_sold DESC, revenue_cents DESC, p.name
            LIMIT ?3
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(top)
    }

    /// Products at or below their alert threshold.
    pub async fn low_stock(&self, limit: u32) -> DbResult<Vec<Product>> {
        ProductRepository::new(self.pool.clone()).low_stock(limit).await
    }

    /// Regular sales grouped by month in `[from, to)`, oldest month first.
    pub async fn monthly(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<MonthlySummary>> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            r#"
            SELECT substr(sale_date, 1, 7) AS month,
                   COALESCE(SUM(total_cents), 0),
                   COUNT(*)
            FROM sales
            WHERE sale_date >= ?1 AND sale_date < ?2 AND payment_method != 'return'
            GROUP BY month
            ORDER BY month
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(month, total, count)| MonthlySummary::new(month, total, count))
            .collect())
    }

    /// Every sale in `[from, to)` with the per-method breakdown.
    pub async fn sales_report(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DbResult<SalesReport> {
        let sales = SaleRepository::new(self.pool.clone())
            .list_between(from, to)
            .await?;

        debug!(%from, %to, sales = sales.len(), "Building sales report");

        Ok(SalesReport::from_sales(from, to, sales))
    }

    /// Admin landing page: the day's summary, the best sellers of the
    /// trailing 30 days and the low-stock alert.
    pub async fn dashboard(&self, today: NaiveDate, top_n: u32, low_stock_limit: u32) -> DbResult<Dashboard> {
        let (_, end) = day_bounds(today)?;
        let start = end - Duration::days(DASHBOARD_WINDOW_DAYS);

        Ok(Dashboard {
            today: self.daily_summary(today).await?,
            top_products: self.top_products(start, end, top_n).await?,
            low_stock: self.low_stock(low_stock_limit).await?,
        })
    }

    /// Products grouped by supplier with their stock value at cost.
    ///
    /// Products without a supplier come last, under "No supplier".
    pub async fn supplier_inventory(&self) -> DbResult<Vec<SupplierInventory>> {
        let names: Vec<(String, String)> = sqlx::query_as("SELECT id, name FROM suppliers")
            .fetch_all(&self.pool)
            .await?;
        let names: BTreeMap<String, String> = names.into_iter().collect();

        let products = ProductRepository::new(self.pool.clone()).list_all().await?;

        let mut grouped: BTreeMap<Option<String>, Vec<Product>> = BTreeMap::new();
        for product in products {
            grouped
                .entry(product.supplier_id.clone())
                .or_default()
                .push(product);
        }

        let mut inventory: Vec<SupplierInventory> = grouped
            .into_iter()
            .map(|(supplier_id, products)| {
                let name = supplier_id
                    .as_ref()
                    .and_then(|id| names.get(id).cloned())
                    .unwrap_or_else(|| "No supplier".to_string());
                SupplierInventory::new(supplier_id, name, products)
            })
            .collect();

        inventory.sort_by(|a, b| {
            a.supplier_id
                .is_none()
                .cmp(&b.supplier_id.is_none())
                .then_with(|| a.supplier_name.cmp(&b.supplier_name))
        });

        Ok(inventory)
    }
}

/// `[00:00, next day 00:00)` of a UTC calendar day.
///
/// The last representable day has no next midnight and is rejected.
pub fn day_bounds(date: NaiveDate) -> DbResult<(DateTime<Utc>, DateTime<Utc>)> {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    let end = start
        .checked_add_signed(Duration::days(1))
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "date".to_string(),
            min: i64::from(NaiveDate::MIN.year()),
            max: i64::from(NaiveDate::MAX.year()) - 1,
        })?;
    Ok((start, end))
}
