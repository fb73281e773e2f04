//! # Return Commands
//!
//! ## Return Screen
//! ```text
//! search_returnable("3f2a")          cashier types the receipt id prefix
//!      │
//!      ▼
//! [ sale 3f2a9c.. │ Hammer  bought 3  returned 0  remaining 3 ]
//!      │
//!      ▼
//! process_return { saleId, items: [{ saleItemId, quantity: 2 }], motive }
//!      │
//!      ├── more than remaining ─► VALIDATION_ERROR (nothing written)
//!      ├── no open drawer ──────► NO_ACTIVE_SESSION
//!      ▼
//! stock back on the shelf, negative sale in the original session,
//! cash refund taken from the cashier's open drawer
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use ferre_core::{Actor, ReturnReceipt, ReturnRequest, ReturnableSale, SaleReturn};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReturnRequest {
    pub sale_id: String,
    /// One entry per original sale item. Zero quantities are ignored.
    pub items: Vec<ReturnRequest>,
    #[serde(default)]
    pub motive: String,
}

/// Regular sales whose id starts with `query`, with what can still be returned.
pub async fn search_returnable(state: &AppState, query: &str) -> ApiResult<Vec<ReturnableSale>> {
    let limit = state.config().search_limit;
    Ok(state.db().returns().search_returnable(query, limit).await?)
}

pub async fn get_returnable(state: &AppState, sale_id: &str) -> ApiResult<ReturnableSale> {
    Ok(state.db().returns().returnable(sale_id).await?)
}

/// Processes a return on behalf of the actor.
pub async fn process_return(
    state: &AppState,
    actor: &Actor,
    request: ProcessReturnRequest,
) -> ApiResult<ReturnReceipt> {
    debug!(
        user = %actor.username,
        sale_id = %request.sale_id,
        lines = request.items.len(),
        "process_return command"
    );

    let receipt = state
        .db()
        .returns()
        .process_return(&request.sale_id, &request.items, &request.motive, &actor.user_id)
        .await?;

    Ok(receipt)
}

/// Returns already processed against a sale.
pub async fn sale_returns(state: &AppState, sale_id: &str) -> ApiResult<Vec<SaleReturn>> {
    Ok(state.db().returns().list_for_sale(sale_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, AddToCartRequest};
    use crate::commands::sale::{checkout, CheckoutRequest};
    use crate::commands::session::{open_session, OpenSessionRequest};
    use crate::error::ErrorCode;
    use crate::state::test_support::{actor, stocked, test_state};

    async fn sold_three_hammers(state: &AppState, cashier: &Actor) -> ferre_core::SaleWithItems {
        stocked(state, "A1", 1000, 5).await;
        open_session(
            state,
            cashier,
            OpenSessionRequest {
                starting_balance: "100".to_string(),
            },
        )
        .await
        .unwrap();
        add_to_cart(
            state,
            cashier,
            AddToCartRequest {
                sku: "A1".to_string(),
                quantity: 3,
            },
        )
        .await
        .unwrap();

        checkout(
            state,
            cashier,
            CheckoutRequest {
                payment_method: "cash".to_string(),
                client_id: None,
            },
        )
        .await
        .unwrap()
        .sale
    }

    fn request(sale: &ferre_core::SaleWithItems, quantity: i64) -> ProcessReturnRequest {
        ProcessReturnRequest {
            sale_id: sale.sale.id.clone(),
            items: vec![ReturnRequest {
                sale_item_id: sale.items[0].id.clone(),
                quantity,
            }],
            motive: "damaged".to_string(),
        }
    }

    #[tokio::test]
    async fn test_return_two_of_three() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let sale = sold_three_hammers(&state, &ana).await;

        let receipt = process_return(&state, &ana, request(&sale, 2)).await.unwrap();

        assert_eq!(receipt.sale_return.total_refund_cents, 2000);
        assert_eq!(receipt.compensating_sale.total_cents, -2000);
        assert_eq!(receipt.compensating_sale.session_id, sale.sale.session_id);

        let returnable = get_returnable(&state, &sale.sale.id).await.unwrap();
        assert_eq!(returnable.items[0].remaining, 1);
        assert_eq!(sale_returns(&state, &sale.sale.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_over_return_is_rejected() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let sale = sold_three_hammers(&state, &ana).await;

        process_return(&state, &ana, request(&sale, 2)).await.unwrap();
        let err = process_return(&state, &ana, request(&sale, 2)).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(sale_returns(&state, &sale.sale.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_repeated_lines_are_a_validation_error() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let sale = sold_three_hammers(&state, &ana).await;

        let mut form = request(&sale, i64::MAX);
        form.items.push(ReturnRequest {
            sale_item_id: sale.items[0].id.clone(),
            quantity: 2,
        });
        let err = process_return(&state, &ana, form).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(sale_returns(&state, &sale.sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_prefix() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let sale = sold_three_hammers(&state, &ana).await;

        let found = search_returnable(&state, &sale.sale.id[..8]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].items[0].remaining, 3);

        assert!(search_returnable(&state, "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_requires_open_drawer() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let luis = actor(&state, "luis", false).await;
        let sale = sold_three_hammers(&state, &ana).await;

        let err = process_return(&state, &luis, request(&sale, 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoActiveSession);
    }
}
