//! # Sale Commands
//!
//! ## Checkout
//! ```text
//! checkout { paymentMethod: "cash", clientId: null }
//!      │
//!      ├── "return" / unknown method ─► VALIDATION_ERROR
//!      ├── empty cart ────────────────► CART_ERROR
//!      ├── no open drawer ────────────► NO_ACTIVE_SESSION
//!      ├── shelf ran short ───────────► INSUFFICIENT_STOCK (nothing written)
//!      ▼
//! one transaction: stock down, sale + items, cash ledger, cart cleared
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;
use ferre_core::validation::validate_limit;
use ferre_core::{Actor, PaymentMethod, Sale, SaleWithItems};

const MAX_RECENT_SALES: u32 = 200;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub client_id: Option<String>,
}

fn default_payment_method() -> String {
    PaymentMethod::Cash.as_str().to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutResponse {
    pub sale: SaleWithItems,
    pub item_count: usize,
}

/// Turns the actor's cart into a sale.
pub async fn checkout(
    state: &AppState,
    actor: &Actor,
    request: CheckoutRequest,
) -> ApiResult<CheckoutResponse> {
    debug!(user = %actor.username, method = %request.payment_method, "checkout command");

    let method = PaymentMethod::for_checkout(&request.payment_method)?;
    let client_id = request
        .client_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty());

    let sale = state
        .db()
        .sales()
        .checkout(&actor.user_id, method, client_id)
        .await?;

    Ok(CheckoutResponse {
        item_count: sale.items.len(),
        sale,
    })
}

pub async fn get_sale(state: &AppState, sale_id: &str) -> ApiResult<SaleWithItems> {
    Ok(state.db().sales().get_with_items(sale_id).await?)
}

/// Latest sales across all sessions.
pub async fn recent_sales(state: &AppState, limit: u32) -> ApiResult<Vec<Sale>> {
    validate_limit(limit, MAX_RECENT_SALES)?;
    Ok(state.db().sales().recent(limit).await?)
}

/// Sales recorded against one session, compensating sales included.
pub async fn session_sales(state: &AppState, session_id: &str) -> ApiResult<Vec<Sale>> {
    state.db().sessions().require(session_id).await?;
    Ok(state.db().sales().list_for_session(session_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, AddToCartRequest};
    use crate::commands::session::{open_session, OpenSessionRequest};
    use crate::error::ErrorCode;
    use crate::state::test_support::{actor, stocked, test_state};

    fn cash() -> CheckoutRequest {
        CheckoutRequest {
            payment_method: "cash".to_string(),
            client_id: None,
        }
    }

    async fn scan(state: &AppState, actor: &Actor, sku: &str, times: usize) {
        for _ in 0..times {
            add_to_cart(
                state,
                actor,
                AddToCartRequest {
                    sku: sku.to_string(),
                    quantity: 1,
                },
            )
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_cash_checkout_end_to_end() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let hammer = stocked(&state, "A1", 1000, 5).await;
        let session = open_session(
            &state,
            &ana,
            OpenSessionRequest {
                starting_balance: "100.00".to_string(),
            },
        )
        .await
        .unwrap();

        scan(&state, &ana, "A1", 3).await;
        let response = checkout(&state, &ana, cash()).await.unwrap();

        assert_eq!(response.sale.sale.total_cents, 3000);
        assert_eq!(response.item_count, 1);
        assert_eq!(
            state.db().products().get_by_id(&hammer.id).await.unwrap().unwrap().stock,
            2
        );
        let session = state.db().sessions().require(&session.id).await.unwrap();
        assert_eq!(session.ledger_balance().cents(), 13000);
        assert!(get_cart(&state, &ana).await.unwrap().lines.is_empty());

        let fetched = get_sale(&state, &response.sale.sale.id).await.unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(session_sales(&state, &session.id).await.unwrap().len(), 1);
        assert_eq!(recent_sales(&state, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_return_method_rejected_at_checkout() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;

        let err = checkout(
            &state,
            &ana,
            CheckoutRequest {
                payment_method: "return".to_string(),
                client_id: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_checkout_preconditions() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        stocked(&state, "A1", 1000, 5).await;

        open_session(&state, &ana, OpenSessionRequest::default())
            .await
            .unwrap();
        let err = checkout(&state, &ana, cash()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        let luis = actor(&state, "luis", false).await;
        scan(&state, &luis, "A1", 1).await;
        let err = checkout(&state, &luis, cash()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NoActiveSession);
        assert_eq!(get_cart(&state, &luis).await.unwrap().lines.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        stocked(&state, "A1", 1000, 5).await;
        open_session(&state, &ana, OpenSessionRequest::default())
            .await
            .unwrap();
        scan(&state, &ana, "A1", 1).await;

        let err = checkout(
            &state,
            &ana,
            CheckoutRequest {
                payment_method: "card".to_string(),
                client_id: Some("missing".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
