//! # Access Commands
//!
//! Called by the web layer's request middleware and right after login.

use crate::error::ApiResult;
use crate::gate::Landing;
use crate::state::AppState;
use ferre_core::{Actor, GateDecision};

/// Gate decision for one request. `actor` is `None` for anonymous requests.
pub async fn check_access(
    state: &AppState,
    actor: Option<&Actor>,
    path: &str,
) -> ApiResult<GateDecision> {
    state.gate().check(state.db(), actor, path).await
}

/// Post-login destination for `actor`.
pub async fn landing(state: &AppState, actor: &Actor) -> ApiResult<Landing> {
    state.gate().landing(state.db(), actor).await
}
