//! # Domain Types
//!
//! Core domain types used throughout FerrePOS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌─────────────────┐   ┌──────────────────┐     │
//! │  │ CashDrawerSession│◄──│      Sale       │──►│    SaleItem      │     │
//! │  │ ──────────────── │   │ ─────────────── │   │ ──────────────── │     │
//! │  │ user_id          │   │ session_id (FK) │   │ product snapshot │     │
//! │  │ opening_float    │   │ payment_method  │   │ unit_price       │     │
//! │  │ accumulated_cash │   │ total_cents     │   │ subtotal         │     │
//! │  │ end_time (null → │   └────────▲────────┘   └────────▲─────────┘     │
//! │  │   while open)    │            │ compensating        │ sale_item_id  │
//! │  └──────────────────┘   ┌────────┴────────┐   ┌────────┴─────────┐     │
//! │                         │   SaleReturn    │──►│  SaleReturnItem  │     │
//! │                         │ total_refund    │   │ quantity, refund │     │
//! │                         └─────────────────┘   └──────────────────┘     │
//! │                                                                         │
//! │  Catalog: Product ──► Category?, Supplier?        Client (optional)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ids are UUID v4 strings. Sales are immutable: a return never edits
//! the original sale, it records a compensating sale with a negative total.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Users
// =============================================================================

/// A staff account. Authentication lives outside this system; the row
/// exists so sessions, sales and returns can reference their actor.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub is_admin: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// The authenticated user on whose behalf a command runs.
///
/// Supplied by the web layer after it has authenticated the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Actor {
    pub user_id: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Actor {
            user_id: user.id.clone(),
            username: user.username.clone(),
            is_admin: user.is_admin,
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product category. Deleting one leaves its products uncategorised.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Supplier of products.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product on the shelf.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit, the code the cashier scans or types.
    pub sku: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Purchase cost in cents, if known.
    pub cost_cents: Option<i64>,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// At or below this level the product appears in the low-stock alert.
    pub low_stock_threshold: i64,

    pub category_id: Option<String>,
    pub supplier_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the stock on hand at cost. Unknown cost counts as zero.
    pub fn stock_value_at_cost(&self) -> Money {
        Money::from_cents(self.cost_cents.unwrap_or(0)).multiply_quantity(self.stock)
    }

    /// Checks whether `quantity` units can be taken from stock.
    #[inline]
    pub fn can_sell(&self, quantity: i64) -> bool {
        quantity <= self.stock
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.low_stock_threshold
    }
}

/// A customer. Optional on a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Tax identifier, unique across clients.
    pub tax_id: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Trade customer (contractor, plumber, ...).
    pub is_professional: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Cash Drawer Session
// =============================================================================

/// Lifecycle state of a cash-drawer session.
///
/// ```text
///   open(user, float)           close(ending, notes)
///  ─────────────────► OPEN ─────────────────────────► CLOSED (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// A cashier's till shift.
///
/// The drawer ledger is split in two explicit fields: the float the cashier
/// counted in at open time, and the cash taken since. Their sum is what the
/// drawer should hold.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CashDrawerSession {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    /// Null while the session is open.
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub opening_float_cents: i64,
    /// Cash sales minus cash refunds taken during the session.
    pub accumulated_cash_cents: i64,
    /// Counted at close time. Null while open.
    pub ending_balance_cents: Option<i64>,
    pub notes: String,
}

impl CashDrawerSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    pub fn status(&self) -> SessionStatus {
        if self.is_open() {
            SessionStatus::Open
        } else {
            SessionStatus::Closed
        }
    }

    /// What the drawer should hold: opening float plus accumulated cash.
    pub fn ledger_balance(&self) -> Money {
        Money::from_cents(self.opening_float_cents + self.accumulated_cash_cents)
    }

    /// Counted balance minus ledger balance. `None` until the session closes.
    ///
    /// Negative means the drawer came up short.
    pub fn difference(&self) -> Option<Money> {
        self.ending_balance_cents
            .map(|ending| Money::from_cents(ending) - self.ledger_balance())
    }
}

/// Audit view of one session, as shown to an administrator.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub session: CashDrawerSession,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    /// Compensating sales recorded against this session, as a positive amount.
    pub refunds_cents: i64,
    pub ledger_balance_cents: i64,
    pub difference_cents: Option<i64>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was settled. `Return` marks compensating sales produced by
/// the return flow and is never accepted at checkout.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Return,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Return => "return",
        }
    }

    /// Parses a payment method chosen at checkout. Only cash and card.
    ///
    /// ## Example
    /// ```rust
    /// use ferre_core::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::for_checkout("card").unwrap(), PaymentMethod::Card);
    /// assert!(PaymentMethod::for_checkout("return").is_err());
    /// ```
    pub fn for_checkout(input: &str) -> Result<PaymentMethod, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A recorded sale. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub session_id: String,
    pub seller_id: String,
    pub client_id: Option<String>,
    pub payment_method: PaymentMethod,
    /// Negative for compensating return sales.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub sale_date: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn is_compensation(&self) -> bool {
        self.payment_method == PaymentMethod::Return
    }
}

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub product_name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub subtotal_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }
}

/// A sale together with its line items, as returned by checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Returns
// =============================================================================

/// A processed return against an original sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturn {
    pub id: String,
    /// The original sale.
    pub sale_id: String,
    pub processed_by: String,
    pub motive: String,
    pub total_refund_cents: i64,
    /// The negative sale recorded in the original sale's session.
    pub compensating_sale_id: String,
    #[ts(as = "String")]
    pub return_date: DateTime<Utc>,
}

/// One returned line of a [`SaleReturn`].
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleReturnItem {
    pub id: String,
    pub return_id: String,
    pub sale_item_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub refund_cents: i64,
}

/// A processed return with its items and the compensating sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnReceipt {
    pub sale_return: SaleReturn,
    pub items: Vec<SaleReturnItem>,
    pub compensating_sale: Sale,
}

/// A sale item as seen from the return screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnableItem {
    pub item: SaleItem,
    pub already_returned: i64,
    pub remaining: i64,
}

/// A sale found by the return search, with what can still be returned.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReturnableSale {
    pub sale: Sale,
    pub items: Vec<ReturnableItem>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn session(ending: Option<i64>) -> CashDrawerSession {
        CashDrawerSession {
            id: "s1".to_string(),
            user_id: "u1".to_string(),
            start_time: Utc::now(),
            end_time: ending.map(|_| Utc::now()),
            opening_float_cents: 10_000,
            accumulated_cash_cents: 3_000,
            ending_balance_cents: ending,
            notes: String::new(),
        }
    }

    #[test]
    fn test_ledger_balance_is_float_plus_cash() {
        let s = session(None);
        assert!(s.is_open());
        assert_eq!(s.status(), SessionStatus::Open);
        assert_eq!(s.ledger_balance().cents(), 13_000);
        assert_eq!(s.difference(), None);
    }

    #[test]
    fn test_difference_after_close() {
        let s = session(Some(12_500));
        assert_eq!(s.status(), SessionStatus::Closed);
        assert_eq!(s.difference().unwrap().cents(), -500);
    }

    #[test]
    fn test_payment_method_for_checkout() {
        assert_eq!(PaymentMethod::for_checkout("cash").unwrap(), PaymentMethod::Cash);
        assert_eq!(PaymentMethod::for_checkout(" CARD ").unwrap(), PaymentMethod::Card);
        assert!(PaymentMethod::for_checkout("return").is_err());
        assert!(PaymentMethod::for_checkout("").is_err());
    }

    #[test]
    fn test_payment_method_serde_is_lowercase() {
        let json = serde_json::to_string(&PaymentMethod::Return).unwrap();
        assert_eq!(json, "\"return\"");
        assert_eq!(PaymentMethod::Card.to_string(), "card");
    }

    #[test]
    fn test_product_stock_helpers() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            sku: "A1".to_string(),
            name: "Hammer".to_string(),
            price_cents: 1000,
            cost_cents: Some(600),
            stock: 5,
            low_stock_threshold: 5,
            category_id: None,
            supplier_id: None,
            created_at: now,
            updated_at: now,
        };
        assert!(product.can_sell(5));
        assert!(!product.can_sell(6));
        assert!(product.is_low_stock());
        assert_eq!(product.stock_value_at_cost().cents(), 3000);
    }
}
