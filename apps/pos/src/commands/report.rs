//! # Report Commands
//!
//! Read-only views for the admin pages and the operator binary.
//!
//! ## Date Ranges
//! ```text
//! DateRange { from: 2024-03-01, to: 2024-03-31 }      both days included
//!      │
//!      ▼
//! [2024-03-01T00:00Z, 2024-04-01T00:00Z)               what the queries see
//! ```
//! Compensating return sales show up as refunds, never as sales.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use ferre_core::{
    DailySummary, Dashboard, MonthlySummary, Product, ReportTable, SalesReport, SupplierInventory,
    TopProduct,
};
use ferre_db::day_bounds;

/// Inclusive range of calendar days (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange { from, to }
    }

    /// The whole calendar year.
    pub fn year(year: i32) -> ApiResult<Self> {
        let from = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| ApiError::validation(format!("year {} is out of range", year)))?;
        let to = NaiveDate::from_ymd_opt(year, 12, 31)
            .ok_or_else(|| ApiError::validation(format!("year {} is out of range", year)))?;
        Ok(DateRange { from, to })
    }

    /// Half-open timestamp bounds covering every day of the range.
    fn bounds(&self) -> ApiResult<(DateTime<Utc>, DateTime<Utc>)> {
        if self.from > self.to {
            return Err(ApiError::validation(format!(
                "from ({}) must not be after to ({})",
                self.from, self.to
            )));
        }
        let (start, _) = day_bounds(self.from)?;
        let (_, end) = day_bounds(self.to)?;
        Ok((start, end))
    }
}

/// Today's summary, best sellers and the low-stock alert.
pub async fn dashboard(state: &AppState) -> ApiResult<Dashboard> {
    let config = state.config();
    let today = Utc::now().date_naive();

    Ok(state
        .db()
        .reports()
        .dashboard(today, config.top_products_limit, config.low_stock_limit)
        .await?)
}

pub async fn daily_summary(state: &AppState, date: NaiveDate) -> ApiResult<DailySummary> {
    Ok(state.db().reports().daily_summary(date).await?)
}

pub async fn top_products(
    state: &AppState,
    range: DateRange,
    limit: Option<u32>,
) -> ApiResult<Vec<TopProduct>> {
    let (from, to) = range.bounds()?;
    let limit = limit.unwrap_or(state.config().top_products_limit);

    Ok(state.db().reports().top_products(from, to, limit).await?)
}

/// Every sale of the range with cash, card and refund subtotals.
pub async fn sales_report(state: &AppState, range: DateRange) -> ApiResult<SalesReport> {
    let (from, to) = range.bounds()?;
    debug!(from = %range.from, to = %range.to, "sales_report command");

    Ok(state.db().reports().sales_report(from, to).await?)
}

/// The sales report flattened for an exporter.
pub async fn sales_report_table(state: &AppState, range: DateRange) -> ApiResult<ReportTable> {
    let report = sales_report(state, range).await?;

    let mut table = ReportTable::from_sales_report(&report);
    table.title = format!(
        "{}: Sales {} to {}",
        state.config().store_name,
        range.from,
        range.to
    );
    Ok(table)
}

pub async fn monthly_summary(state: &AppState, range: DateRange) -> ApiResult<Vec<MonthlySummary>> {
    let (from, to) = range.bounds()?;
    Ok(state.db().reports().monthly(from, to).await?)
}

pub async fn monthly_table(state: &AppState, range: DateRange) -> ApiResult<ReportTable> {
    let months = monthly_summary(state, range).await?;

    let mut table = ReportTable::from_monthly(&months);
    table.title = format!("{}: {}", state.config().store_name, table.title);
    Ok(table)
}

pub async fn low_stock_alert(state: &AppState) -> ApiResult<Vec<Product>> {
    let limit = state.config().low_stock_limit;
    Ok(state.db().reports().low_stock(limit).await?)
}

pub async fn supplier_inventory(state: &AppState) -> ApiResult<Vec<SupplierInventory>> {
    Ok(state.db().reports().supplier_inventory().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, AddToCartRequest};
    use crate::commands::returns::{process_return, ProcessReturnRequest};
    use crate::commands::sale::{checkout, CheckoutRequest};
    use crate::commands::session::{open_session, OpenSessionRequest};
    use crate::error::ErrorCode;
    use crate::state::test_support::{actor, stocked, test_state};
    use chrono::Datelike;
    use ferre_core::{Actor, ReturnRequest, SaleWithItems};

    async fn sell(state: &AppState, cashier: &Actor, sku: &str, quantity: i64, method: &str) -> SaleWithItems {
        add_to_cart(
            state,
            cashier,
            AddToCartRequest {
                sku: sku.to_string(),
                quantity,
            },
        )
        .await
        .unwrap();
        checkout(
            state,
            cashier,
            CheckoutRequest {
                payment_method: method.to_string(),
                client_id: None,
            },
        )
        .await
        .unwrap()
        .sale
    }

    fn today() -> DateRange {
        let today = Utc::now().date_naive();
        DateRange::new(today, today)
    }

    #[tokio::test]
    async fn test_reports_after_a_day_of_trading() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        stocked(&state, "A1", 1000, 5).await;
        stocked(&state, "B2", 250, 40).await;
        open_session(&state, &ana, OpenSessionRequest::default())
            .await
            .unwrap();

        let first = sell(&state, &ana, "A1", 3, "cash").await;
        sell(&state, &ana, "B2", 4, "card").await;
        process_return(
            &state,
            &ana,
            ProcessReturnRequest {
                sale_id: first.sale.id.clone(),
                items: vec![ReturnRequest {
                    sale_item_id: first.items[0].id.clone(),
                    quantity: 1,
                }],
                motive: String::new(),
            },
        )
        .await
        .unwrap();

        let report = sales_report(&state, today()).await.unwrap();
        assert_eq!(report.sales.len(), 3);
        assert_eq!(report.cash_total_cents, 3000);
        assert_eq!(report.card_total_cents, 1000);
        assert_eq!(report.refund_total_cents, 1000);
        assert_eq!(report.net_total_cents, 3000);

        let table = sales_report_table(&state, today()).await.unwrap();
        assert!(table.title.starts_with("FerrePOS Hardware"));
        assert_eq!(table.rows.len(), 3 + 4);

        let dash = dashboard(&state).await.unwrap();
        assert_eq!(dash.today.gross_sales_cents, 4000);
        assert_eq!(dash.today.refunds_cents, 1000);
        assert_eq!(dash.today.transaction_count, 2);
        assert_eq!(dash.top_products[0].quantity_sold, 4);

        let top = top_products(&state, today(), Some(1)).await.unwrap();
        assert_eq!(top.len(), 1);

        let low = low_stock_alert(&state).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].sku, "A1");
    }

    #[tokio::test]
    async fn test_monthly_and_inventory() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        stocked(&state, "A1", 1000, 5).await;
        open_session(&state, &ana, OpenSessionRequest::default())
            .await
            .unwrap();
        sell(&state, &ana, "A1", 2, "cash").await;

        let range = DateRange::year(Utc::now().year()).unwrap();
        let months = monthly_summary(&state, range).await.unwrap();
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].total_sales_cents, 2000);

        let table = monthly_table(&state, range).await.unwrap();
        assert_eq!(table.rows.len(), 1);

        let inventory = supplier_inventory(&state).await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].supplier_name, "No supplier");
        assert_eq!(inventory[0].total_units, 3);
    }

    #[tokio::test]
    async fn test_inverted_range_is_rejected() {
        let state = test_state().await;
        let today = Utc::now().date_naive();
        let range = DateRange::new(today, today.pred_opt().unwrap());

        let err = sales_report(&state, range).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_range_ending_on_the_last_day_is_rejected() {
        let state = test_state().await;
        let range = DateRange::new(Utc::now().date_naive(), NaiveDate::MAX);

        let err = sales_report(&state, range).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = daily_summary(&state, NaiveDate::MAX).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
