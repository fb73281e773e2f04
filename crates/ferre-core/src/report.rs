//! # Report Read Models
//!
//! Result types of the read-side aggregations and their tabular projection.
//!
//! ```text
//!  ferre-db::ReportRepository ──► DailySummary / MonthlySummary / SalesReport
//!                                          │
//!                                          ▼
//!                                    ReportTable { headers, rows }
//!                                          │
//!                                          ▼
//!                              exporter (PDF / spreadsheet, external)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Product, Sale};

// =============================================================================
// Read Models
// =============================================================================

/// Totals for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    /// Regular sales only; compensating sales are excluded.
    pub gross_sales_cents: i64,
    /// Refunded amount, positive.
    pub refunds_cents: i64,
    pub net_sales_cents: i64,
    /// Regular sales count.
    pub transaction_count: i64,
    pub average_ticket_cents: i64,
}

impl DailySummary {
    pub fn new(date: NaiveDate, gross_sales_cents: i64, refunds_cents: i64, transaction_count: i64) -> Self {
        DailySummary {
            date,
            gross_sales_cents,
            refunds_cents,
            net_sales_cents: gross_sales_cents - refunds_cents,
            transaction_count,
            average_ticket_cents: Money::from_cents(gross_sales_cents)
                .average_over(transaction_count)
                .cents(),
        }
    }
}

/// A best seller within a date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TopProduct {
    pub product_id: String,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// Totals for one month ("YYYY-MM").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlySummary {
    pub month: String,
    pub total_sales_cents: i64,
    pub transaction_count: i64,
    pub average_ticket_cents: i64,
}

impl MonthlySummary {
    pub fn new(month: String, total_sales_cents: i64, transaction_count: i64) -> Self {
        MonthlySummary {
            month,
            total_sales_cents,
            transaction_count,
            average_ticket_cents: Money::from_cents(total_sales_cents)
                .average_over(transaction_count)
                .cents(),
        }
    }
}

/// Every sale in `[from, to)` with a breakdown by payment method.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesReport {
    #[ts(as = "String")]
    pub from: DateTime<Utc>,
    #[ts(as = "String")]
    pub to: DateTime<Utc>,
    pub sales: Vec<Sale>,
    pub cash_total_cents: i64,
    pub card_total_cents: i64,
    /// Sum of compensating sales, as a positive amount.
    pub refund_total_cents: i64,
    pub net_total_cents: i64,
}

impl SalesReport {
    /// Builds the report, computing the breakdown from the sales themselves.
    pub fn from_sales(from: DateTime<Utc>, to: DateTime<Utc>, sales: Vec<Sale>) -> Self {
        use crate::types::PaymentMethod;

        let total_of = |method: PaymentMethod| -> Money {
            sales
                .iter()
                .filter(|s| s.payment_method == method)
                .map(Sale::total)
                .sum()
        };
        let cash = total_of(PaymentMethod::Cash);
        let card = total_of(PaymentMethod::Card);
        let refunds = total_of(PaymentMethod::Return).abs();

        SalesReport {
            from,
            to,
            cash_total_cents: cash.cents(),
            card_total_cents: card.cents(),
            refund_total_cents: refunds.cents(),
            net_total_cents: (cash + card - refunds).cents(),
            sales,
        }
    }
}

/// Admin landing page.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Dashboard {
    pub today: DailySummary,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<Product>,
}

/// Products of one supplier with their stock valued at cost.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SupplierInventory {
    /// `None` groups products without a supplier.
    pub supplier_id: Option<String>,
    pub supplier_name: String,
    pub products: Vec<Product>,
    pub total_units: i64,
    pub stock_value_cents: i64,
}

impl SupplierInventory {
    pub fn new(supplier_id: Option<String>, supplier_name: String, products: Vec<Product>) -> Self {
        let total_units = products.iter().map(|p| p.stock).sum();
        let stock_value: Money = products.iter().map(Product::stock_value_at_cost).sum();
        SupplierInventory {
            supplier_id,
            supplier_name,
            products,
            total_units,
            stock_value_cents: stock_value.cents(),
        }
    }
}

// =============================================================================
// Tabular Projection
// =============================================================================

/// A report flattened to strings, ready for an exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    fn new(title: &str, headers: &[&str]) -> Self {
        ReportTable {
            title: title.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// One row per sale followed by the per-method totals.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use ferre_core::report::{ReportTable, SalesReport};
    ///
    /// let report = SalesReport::from_sales(Utc::now(), Utc::now(), vec![]);
    /// let table = ReportTable::from_sales_report(&report);
    /// assert_eq!(table.headers[0], "Sale");
    /// assert_eq!(table.rows.len(), 4); // totals only
    /// ```
    pub fn from_sales_report(report: &SalesReport) -> Self {
        let mut table = Self::new(
            &format!(
                "Sales {} to {}",
                report.from.format("%Y-%m-%d"),
                report.to.format("%Y-%m-%d")
            ),
            &["Sale", "Date", "Seller", "Payment method", "Total"],
        );

        for sale in &report.sales {
            table.rows.push(vec![
                sale.id.clone(),
                sale.sale_date.format("%Y-%m-%d %H:%M").to_string(),
                sale.seller_id.clone(),
                sale.payment_method.to_string(),
                sale.total().to_decimal_string(),
            ]);
        }

        for (label, cents) in [
            ("Cash total", report.cash_total_cents),
            ("Card total", report.card_total_cents),
            ("Refunds", report.refund_total_cents),
            ("Net total", report.net_total_cents),
        ] {
            table.rows.push(vec![
                String::new(),
                String::new(),
                String::new(),
                label.to_string(),
                Money::from_cents(cents).to_decimal_string(),
            ]);
        }

        table
    }

    /// One row per month.
    pub fn from_monthly(months: &[MonthlySummary]) -> Self {
        let mut table = Self::new(
            "Monthly summary",
            &["Month", "Transactions", "Total", "Average ticket"],
        );
        for m in months {
            table.rows.push(vec![
                m.month.clone(),
                m.transaction_count.to_string(),
                Money::from_cents(m.total_sales_cents).to_decimal_string(),
                Money::from_cents(m.average_ticket_cents).to_decimal_string(),
            ]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;

    fn sale(id: &str, method: PaymentMethod, total_cents: i64) -> Sale {
        Sale {
            id: id.to_string(),
            session_id: "s1".to_string(),
            seller_id: "u1".to_string(),
            client_id: None,
            payment_method: method,
            total_cents,
            sale_date: Utc::now(),
        }
    }

    #[test]
    fn test_daily_summary_derives_net_and_average() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let summary = DailySummary::new(date, 5000, 2000, 2);
        assert_eq!(summary.net_sales_cents, 3000);
        assert_eq!(summary.average_ticket_cents, 2500);

        let empty = DailySummary::new(date, 0, 0, 0);
        assert_eq!(empty.average_ticket_cents, 0);
    }

    #[test]
    fn test_sales_report_breakdown() {
        let report = SalesReport::from_sales(
            Utc::now(),
            Utc::now(),
            vec![
                sale("a", PaymentMethod::Cash, 3000),
                sale("b", PaymentMethod::Card, 1500),
                sale("c", PaymentMethod::Return, -2000),
            ],
        );
        assert_eq!(report.cash_total_cents, 3000);
        assert_eq!(report.card_total_cents, 1500);
        assert_eq!(report.refund_total_cents, 2000);
        assert_eq!(report.net_total_cents, 2500);
    }

    #[test]
    fn test_sales_table_projection() {
        let report = SalesReport::from_sales(
            Utc::now(),
            Utc::now(),
            vec![sale("c", PaymentMethod::Return, -2000)],
        );
        let table = ReportTable::from_sales_report(&report);

        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.rows[0][3], "return");
        assert_eq!(table.rows[0][4], "-20.00");
        assert_eq!(table.rows.last().unwrap()[4], "-20.00");
        assert!(table.rows.iter().all(|r| r.len() == table.headers.len()));
    }

    #[test]
    fn test_monthly_table_projection() {
        let months = vec![MonthlySummary::new("2024-03".to_string(), 10_000, 3)];
        assert_eq!(months[0].average_ticket_cents, 3333);

        let table = ReportTable::from_monthly(&months);
        assert_eq!(table.rows, vec![vec!["2024-03", "3", "100.00", "33.33"]]);
    }

    #[test]
    fn test_supplier_inventory_values_at_cost() {
        let now = Utc::now();
        let product = |stock, cost| Product {
            id: "p".to_string(),
            sku: "A1".to_string(),
            name: "Hammer".to_string(),
            price_cents: 1000,
            cost_cents: cost,
            stock,
            low_stock_threshold: 5,
            category_id: None,
            supplier_id: Some("sup".to_string()),
            created_at: now,
            updated_at: now,
        };
        let inv = SupplierInventory::new(
            Some("sup".to_string()),
            "Acme".to_string(),
            vec![product(4, Some(600)), product(2, None)],
        );
        assert_eq!(inv.total_units, 6);
        assert_eq!(inv.stock_value_cents, 2400);
    }
}
