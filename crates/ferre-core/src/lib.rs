//! # ferre-core: Pure Business Logic for FerrePOS
//!
//! This crate is the **heart** of FerrePOS. It contains the business rules of
//! the till as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        FerrePOS Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Web front-end (external)                        │   │
//! │  │   Open Till ──► Scan SKU ──► Checkout ──► Close Till            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ commands                               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  ferre-pos (apps/pos)                           │   │
//! │  │   access gate, open_session, add_to_cart, checkout, returns     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ ferre-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌────────┐ ┌────────┐ ┌─────────┐ ┌──────────┐   │   │
//! │  │   │  types  │ │ money  │ │  cart  │ │ returns │ │   gate   │   │   │
//! │  │   │ Session │ │ Money  │ │  Cart  │ │  plan   │ │  policy  │   │   │
//! │  │   │  Sale   │ │ parse  │ │  Line  │ │  caps   │ │          │   │   │
//! │  │   └─────────┘ └────────┘ └────────┘ └─────────┘ └──────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    ferre-db (Database Layer)                    │   │
//! │  │         SQLite queries, migrations, atomic transactions         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, CashDrawerSession, Sale, SaleReturn, ...)
//! - [`money`] - Money type with integer arithmetic and strict decimal parsing
//! - [`cart`] - The per-user cart value object
//! - [`returns`] - Return planning against previously returned quantities
//! - [`gate`] - Access gate policy for POS routes
//! - [`report`] - Report read models and their tabular projection
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use ferre_core::money::Money;
//!
//! // Amounts typed by a cashier are parsed strictly
//! let float = Money::parse_decimal("100.00").unwrap();
//! assert_eq!(float.cents(), 10_000);
//!
//! // Garbage is an error, never a silent zero
//! assert!(Money::parse_decimal("12,5abc").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod gate;
pub mod money;
pub mod report;
pub mod returns;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use gate::{GateDecision, GatePolicy, LandingRoute};
pub use money::Money;
pub use report::{
    DailySummary, Dashboard, MonthlySummary, ReportTable, SalesReport, SupplierInventory, TopProduct,
};
pub use returns::{plan_return, returnable_items, ReturnLine, ReturnPlan, ReturnRequest};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart.
///
/// Guards against typing 1000 instead of 10 at the scanner.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Stock level at or below which a product is listed as low stock
/// when no explicit threshold is given.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;

/// Number of best sellers shown on the dashboard.
pub const DEFAULT_TOP_PRODUCTS: u32 = 5;
