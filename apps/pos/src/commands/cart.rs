//! # Cart Commands
//!
//! The cart belongs to the logged-in user and is stored in the database,
//! so it survives page reloads and is cleared by checkout.
//!
//! ## Scan Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  POS Screen                                                     │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │ SKU: "A1" ⏎                                             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  add_to_cart { sku: "A1" }          quantity defaults to 1     │
//! │           │                                                     │
//! │           ├── unknown SKU ────────► NOT_FOUND                  │
//! │           ├── cart qty > stock ───► INSUFFICIENT_STOCK         │
//! │           ▼                                                     │
//! │  CartResponse { changed line, lines, totals }                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use ferre_core::validation::validate_quantity;
use ferre_core::{Actor, Cart, CartLine, CartTotals};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub sku: String,
    /// Units to add, one scan by default.
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        CartResponse {
            lines: cart.lines().cloned().collect(),
            totals: CartTotals::from(cart),
        }
    }
}

/// Result of adding a product: the line that changed plus the whole cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartResponse {
    pub line: CartLine,
    pub cart: CartResponse,
}

pub async fn get_cart(state: &AppState, actor: &Actor) -> ApiResult<CartResponse> {
    let cart = state.db().carts().load(&actor.user_id).await?;
    Ok(CartResponse::from(&cart))
}

/// Adds a product by SKU, checking the cart quantity against stock.
pub async fn add_to_cart(
    state: &AppState,
    actor: &Actor,
    request: AddToCartRequest,
) -> ApiResult<AddToCartResponse> {
    debug!(user = %actor.username, sku = %request.sku, quantity = request.quantity, "add_to_cart command");

    validate_quantity(request.quantity)?;
    let cart = state
        .db()
        .carts()
        .add_by_sku(&actor.user_id, &request.sku, request.quantity)
        .await?;

    let sku = request.sku.trim();
    let line = cart
        .lines()
        .find(|l| l.sku == sku)
        .cloned()
        .ok_or_else(|| ApiError::internal("Cart line missing after add"))?;

    Ok(AddToCartResponse {
        line,
        cart: CartResponse::from(&cart),
    })
}

pub async fn remove_from_cart(
    state: &AppState,
    actor: &Actor,
    product_id: &str,
) -> ApiResult<CartResponse> {
    let cart = state
        .db()
        .carts()
        .remove_product(&actor.user_id, product_id)
        .await?;
    Ok(CartResponse::from(&cart))
}

/// Totals only, for refreshing the footer after a change.
pub async fn cart_total(state: &AppState, actor: &Actor) -> ApiResult<CartTotals> {
    let cart = state.db().carts().load(&actor.user_id).await?;
    Ok(CartTotals::from(&cart))
}

pub async fn clear_cart(state: &AppState, actor: &Actor) -> ApiResult<()> {
    state.db().carts().clear(&actor.user_id).await?;
    Ok(())
}
