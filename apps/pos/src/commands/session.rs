//! # Cash Drawer Session Commands
//!
//! ## Session Lifecycle
//! ```text
//! login ──► landing: OpenSession
//!              │
//!              ▼
//!   open_session("100.00") ─────────► OPEN
//!              │                        │ checkout (cash) adds to ledger
//!              │                        │ return (cash) subtracts
//!              ▼                        ▼
//!   close_session("128.50", notes) ─► CLOSED ──► forced logout
//! ```
//!
//! Amounts arrive as the decimal strings typed into the form. A blank
//! field is zero; anything unparsable is a validation error.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use ferre_core::validation::validate_limit;
use ferre_core::{Actor, CashDrawerSession, CoreError, Money, SessionSummary};

const MAX_SESSION_LIST: u32 = 500;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenSessionRequest {
    #[serde(default)]
    pub starting_balance: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionRequest {
    #[serde(default)]
    pub ending_balance: String,
    #[serde(default)]
    pub notes: String,
}

/// What the close screen shows before the cashier counts the drawer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosePreview {
    pub session: CashDrawerSession,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub expected_balance_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloseSessionResponse {
    pub summary: SessionSummary,
    /// Always true: the web layer ends the user's login after a close.
    pub force_logout: bool,
}

/// Opens a cash drawer session for the actor.
pub async fn open_session(
    state: &AppState,
    actor: &Actor,
    request: OpenSessionRequest,
) -> ApiResult<CashDrawerSession> {
    debug!(user = %actor.username, "open_session command");

    let float = Money::parse_decimal_field("starting_balance", &request.starting_balance)?;
    let session = state.db().sessions().open(&actor.user_id, float).await?;

    Ok(session)
}

/// The actor's open session, if any.
pub async fn active_session(state: &AppState, actor: &Actor) -> ApiResult<Option<CashDrawerSession>> {
    Ok(state.db().sessions().active_for(&actor.user_id).await?)
}

/// Totals shown on the close screen.
pub async fn close_preview(state: &AppState, actor: &Actor) -> ApiResult<ClosePreview> {
    let session = require_active(state, actor).await?;
    let summary = state.db().sessions().summary(&session.id).await?;

    Ok(ClosePreview {
        expected_balance_cents: summary.ledger_balance_cents,
        cash_sales_cents: summary.cash_sales_cents,
        card_sales_cents: summary.card_sales_cents,
        session: summary.session,
    })
}

/// Closes the actor's open session with the counted balance.
pub async fn close_session(
    state: &AppState,
    actor: &Actor,
    request: CloseSessionRequest,
) -> ApiResult<CloseSessionResponse> {
    debug!(user = %actor.username, "close_session command");

    let ending = Money::parse_decimal_field("ending_balance", &request.ending_balance)?;
    let session = require_active(state, actor).await?;

    let sessions = state.db().sessions();
    sessions.close(&session.id, ending, &request.notes).await?;
    let summary = sessions.summary(&session.id).await?;

    info!(
        session_id = %session.id,
        user = %actor.username,
        difference = ?summary.difference_cents,
        "Cash drawer closed"
    );

    Ok(CloseSessionResponse {
        summary,
        force_logout: true,
    })
}

/// Audit view of any session.
pub async fn session_summary(state: &AppState, session_id: &str) -> ApiResult<SessionSummary> {
    Ok(state.db().sessions().summary(session_id).await?)
}

/// Sessions, newest first, optionally for one user.
pub async fn list_sessions(
    state: &AppState,
    user_id: Option<&str>,
    limit: u32,
) -> ApiResult<Vec<CashDrawerSession>> {
    validate_limit(limit, MAX_SESSION_LIST)?;
    Ok(state.db().sessions().list(user_id, limit).await?)
}

/// Deletes a session that never recorded a sale.
pub async fn delete_session(state: &AppState, session_id: &str) -> ApiResult<()> {
    state.db().sessions().delete(session_id).await?;
    info!(session_id = %session_id, "Cash drawer session deleted");
    Ok(())
}

async fn require_active(state: &AppState, actor: &Actor) -> ApiResult<CashDrawerSession> {
    state
        .db()
        .sessions()
        .active_for(&actor.user_id)
        .await?
        .ok_or_else(|| {
            ApiError::from(CoreError::NoActiveSession {
                user_id: actor.user_id.clone(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::{actor, test_state};

    fn open_with(amount: &str) -> OpenSessionRequest {
        OpenSessionRequest {
            starting_balance: amount.to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_and_close() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;

        let session = open_session(&state, &ana, open_with("100.00")).await.unwrap();
        assert_eq!(session.opening_float_cents, 10000);
        assert!(active_session(&state, &ana).await.unwrap().is_some());

        let preview = close_preview(&state, &ana).await.unwrap();
        assert_eq!(preview.expected_balance_cents, 10000);

        let closed = close_session(
            &state,
            &ana,
            CloseSessionRequest {
                ending_balance: "99.50".to_string(),
                notes: "short fifty cents".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(closed.force_logout);
        assert_eq!(closed.summary.difference_cents, Some(-50));
        assert_eq!(closed.summary.session.notes, "short fifty cents");
        assert!(active_session(&state, &ana).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_open_is_a_conflict() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;

        open_session(&state, &ana, open_with("")).await.unwrap();
        let err = open_session(&state, &ana, open_with("50")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_malformed_amount_is_rejected() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;

        let err = open_session(&state, &ana, open_with("12,50")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(active_session(&state, &ana).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_close_without_session() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;

        let err = close_session(&state, &ana, CloseSessionRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NoActiveSession);
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let session = open_session(&state, &ana, open_with("10")).await.unwrap();

        let listed = list_sessions(&state, Some(&ana.user_id), 10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(
            session_summary(&state, &session.id).await.unwrap().session.id,
            session.id
        );

        delete_session(&state, &session.id).await.unwrap();
        assert_eq!(
            delete_session(&state, &session.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
