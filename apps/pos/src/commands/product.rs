//! # Product Commands
//!
//! Catalog listing for the POS screen and the admin product pages.
//!
//! ## Edit vs Restock
//! ```text
//! edit_product     sku, name, price, cost, threshold, category, supplier
//!                  stock untouched
//! restock_product  stock, threshold
//!                  absolute values from the shelf count
//! ```
//! Stock otherwise only moves through checkout and returns.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use ferre_core::{Money, Product, DEFAULT_LOW_STOCK_THRESHOLD};
use ferre_db::repository::generate_id;

/// Product form as submitted by the admin pages.
///
/// Prices are decimal strings. A blank cost means "unknown".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub cost: String,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub supplier_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockRequest {
    pub stock: i64,
    #[serde(default)]
    pub low_stock_threshold: Option<i64>,
}

/// Product as listed, with its stock flag precomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub product: Product,
    pub is_low_stock: bool,
}

impl From<Product> for ProductDto {
    fn from(product: Product) -> Self {
        ProductDto {
            is_low_stock: product.is_low_stock(),
            product,
        }
    }
}

/// Searches by name or SKU. An empty query lists the catalog.
pub async fn list_products(state: &AppState, query: &str) -> ApiResult<Vec<ProductDto>> {
    let limit = state.config().search_limit;
    let products = state.db().products().search(query, limit).await?;

    debug!(query = %query, results = products.len(), "Product search");
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn get_product(state: &AppState, id: &str) -> ApiResult<ProductDto> {
    state
        .db()
        .products()
        .get_by_id(id)
        .await?
        .map(ProductDto::from)
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn get_product_by_sku(state: &AppState, sku: &str) -> ApiResult<ProductDto> {
    state
        .db()
        .products()
        .get_by_sku(sku)
        .await?
        .map(ProductDto::from)
        .ok_or_else(|| ApiError::not_found("Product", sku.trim()))
}

/// Adds a product with its initial stock.
pub async fn create_product(
    state: &AppState,
    form: ProductForm,
    initial_stock: i64,
) -> ApiResult<ProductDto> {
    let now = Utc::now();
    let product = Product {
        id: generate_id(),
        sku: form.sku.trim().to_string(),
        name: form.name.trim().to_string(),
        price_cents: Money::parse_decimal_field("price", &form.price)?.cents(),
        cost_cents: parse_cost(&form.cost)?,
        stock: initial_stock,
        low_stock_threshold: form.low_stock_threshold.unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD),
        category_id: non_blank(form.category_id),
        supplier_id: non_blank(form.supplier_id),
        created_at: now,
        updated_at: now,
    };

    state.db().products().insert(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product created");

    Ok(ProductDto::from(product))
}

/// Updates the descriptive fields of a product. Stock is left alone.
pub async fn edit_product(state: &AppState, id: &str, form: ProductForm) -> ApiResult<ProductDto> {
    let products = state.db().products();
    let current = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let edited = Product {
        sku: form.sku.trim().to_string(),
        name: form.name.trim().to_string(),
        price_cents: Money::parse_decimal_field("price", &form.price)?.cents(),
        cost_cents: parse_cost(&form.cost)?,
        low_stock_threshold: form
            .low_stock_threshold
            .unwrap_or(current.low_stock_threshold),
        category_id: non_blank(form.category_id),
        supplier_id: non_blank(form.supplier_id),
        ..current
    };

    let updated = products.update(&edited).await?;
    Ok(ProductDto::from(updated))
}

/// Sets the counted stock (and optionally the alert threshold).
pub async fn restock_product(
    state: &AppState,
    id: &str,
    request: RestockRequest,
) -> ApiResult<ProductDto> {
    let products = state.db().products();
    let current = products
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;

    let threshold = request
        .low_stock_threshold
        .unwrap_or(current.low_stock_threshold);
    let updated = products.update_stock(id, request.stock, threshold).await?;

    info!(sku = %updated.sku, from = current.stock, to = updated.stock, "Product restocked");
    Ok(ProductDto::from(updated))
}

fn parse_cost(input: &str) -> ApiResult<Option<i64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(Money::parse_decimal_field("cost", input)?.cents()))
}

fn non_blank(id: Option<String>) -> Option<String> {
    id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
