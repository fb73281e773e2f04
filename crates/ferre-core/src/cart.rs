//! # Cart
//!
//! The per-user shopping cart as a plain serializable value.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Cashier Action           Command                 Cart Change           │
//! │  ──────────────           ───────                 ───────────           │
//! │                                                                         │
//! │  Scan SKU ───────────────► add_to_cart() ───────► line.quantity += 1    │
//! │                                                   (stock re-checked)    │
//! │                                                                         │
//! │  Click Remove ───────────► remove_from_cart() ──► lines.remove(id)     │
//! │                                                                         │
//! │  View Cart ──────────────► get_cart() ──────────► (read only)          │
//! │                                                                         │
//! │  Pay ────────────────────► checkout() ──────────► cleared in the same  │
//! │                                                   transaction as Sale  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Persisted Shape
//! The cart serializes as a JSON object keyed by product id:
//! ```text
//! { "<product_id>": { "product_id", "sku", "name",
//!                     "unit_price_cents", "quantity", "subtotal_cents" } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::Product;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One product in the cart.
///
/// Name, SKU and unit price are frozen when the product is first added.
/// Checkout records these values, not the live catalog ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

impl CartLine {
    fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            subtotal_cents: product.price().multiply_quantity(quantity).cents(),
        }
    }

    fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
        self.subtotal_cents = Money::from_cents(self.unit_price_cents)
            .multiply_quantity(quantity)
            .cents();
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product increases quantity)
/// - Every quantity is > 0 and never above the stock seen when it was added
/// - Maximum lines: [`MAX_CART_ITEMS`]
/// - Maximum quantity per line: [`MAX_ITEM_QUANTITY`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart(BTreeMap<String, CartLine>);

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart(BTreeMap::new())
    }

    /// Adds `quantity` units of a product, or increases the existing line.
    ///
    /// ## Stock Rules
    /// ```text
    /// stock <= 0                       → InsufficientStock (out of stock)
    /// in_cart + quantity > stock       → InsufficientStock (max reached)
    /// in_cart + quantity > 999         → QuantityTooLarge
    /// new line when 100 lines present  → CartTooLarge
    /// ```
    ///
    /// The cart is unchanged when an error is returned.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<&CartLine> {
        if quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }

        let in_cart = self.quantity_of(&product.id);
        let requested = in_cart + quantity;

        if product.stock <= 0 || requested > product.stock {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                name: product.name.clone(),
                available: product.stock.max(0),
                requested,
            });
        }

        if requested > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if in_cart == 0 && self.0.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        let line = self
            .0
            .entry(product.id.clone())
            .and_modify(|line| line.set_quantity(requested))
            .or_insert_with(|| CartLine::from_product(product, quantity));
        Ok(line)
    }

    /// Removes a product line. Returns the removed line, or `None` if the
    /// product was not in the cart.
    pub fn remove_product(&mut self, product_id: &str) -> Option<CartLine> {
        self.0.remove(product_id)
    }

    /// Units of a product currently in the cart.
    pub fn quantity_of(&self, product_id: &str) -> i64 {
        self.0.get(product_id).map_or(0, |line| line.quantity)
    }

    pub fn get(&self, product_id: &str) -> Option<&CartLine> {
        self.0.get(product_id)
    }

    /// Lines in product-id order.
    pub fn lines(&self) -> impl Iterator<Item = &CartLine> {
        self.0.values()
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Sum of line subtotals.
    pub fn total(&self) -> Money {
        self.lines().map(CartLine::subtotal).sum()
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.0.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cart totals summary for API responses.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartTotals {
    pub item_count: usize,
    pub total_quantity: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        CartTotals {
            item_count: cart.item_count(),
            total_quantity: cart.total_quantity(),
            total_cents: cart.total().cents(),
        }
    }
}
