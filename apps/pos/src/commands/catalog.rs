//! # Category & Supplier Commands
//!
//! Reference data for the product form. Deleting a category or supplier
//! keeps its products and clears the reference.

use tracing::info;

use crate::error::ApiResult;
use crate::state::AppState;
use ferre_core::{Category, Supplier};

pub async fn list_categories(state: &AppState) -> ApiResult<Vec<Category>> {
    Ok(state.db().catalog().list_categories().await?)
}

pub async fn create_category(state: &AppState, name: &str) -> ApiResult<Category> {
    let category = state.db().catalog().create_category(name).await?;
    info!(id = %category.id, name = %category.name, "Category created");
    Ok(category)
}

pub async fn delete_category(state: &AppState, id: &str) -> ApiResult<()> {
    Ok(state.db().catalog().delete_category(id).await?)
}

pub async fn list_suppliers(state: &AppState) -> ApiResult<Vec<Supplier>> {
    Ok(state.db().catalog().list_suppliers().await?)
}

pub async fn create_supplier(state: &AppState, name: &str) -> ApiResult<Supplier> {
    let supplier = state.db().catalog().create_supplier(name).await?;
    info!(id = %supplier.id, name = %supplier.name, "Supplier created");
    Ok(supplier)
}

pub async fn delete_supplier(state: &AppState, id: &str) -> ApiResult<()> {
    Ok(state.db().catalog().delete_supplier(id).await?)
}
