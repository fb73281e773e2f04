//! # Access Gate
//!
//! Runs before every request into the POS area. The route rules live in
//! [`GatePolicy`]; this wrapper adds the one database lookup they need.
//!
//! ```text
//! request (actor, path)
//!      │
//!      ▼
//! policy.requires_session? ── no ──► Allow        (no query issued)
//!      │ yes
//!      ▼
//! sessions().active_for(actor) ──► policy.decide(..) ──► Allow | Redirect
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use ferre_core::{Actor, GateDecision, GatePolicy, LandingRoute};
use ferre_db::Database;

/// Post-login destination with its concrete path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Landing {
    pub route: LandingRoute,
    pub location: String,
}

/// The access gate bound to a route policy.
#[derive(Debug, Clone)]
pub struct AccessGate {
    policy: GatePolicy,
}

impl AccessGate {
    pub fn new(policy: GatePolicy) -> Self {
        AccessGate { policy }
    }

    /// Decides whether `actor` may reach `path`.
    pub async fn check(
        &self,
        db: &Database,
        actor: Option<&Actor>,
        path: &str,
    ) -> ApiResult<GateDecision> {
        let Some(cashier) = actor.filter(|a| self.policy.requires_session(Some(*a), path)) else {
            return Ok(GateDecision::Allow);
        };

        let has_session = db.sessions().active_for(&cashier.user_id).await?.is_some();
        let decision = self.policy.decide(actor, path, has_session);

        if decision != GateDecision::Allow {
            debug!(user = %cashier.username, path = %path, "No open session, redirecting");
        }
        Ok(decision)
    }

    /// Where `actor` lands after logging in.
    pub async fn landing(&self, db: &Database, actor: &Actor) -> ApiResult<Landing> {
        let has_session = if actor.is_admin {
            false
        } else {
            db.sessions().active_for(&actor.user_id).await?.is_some()
        };

        let route = self.policy.landing(actor, has_session);
        Ok(Landing {
            route,
            location: self.policy.landing_path(route).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::{actor, test_state};
    use ferre_core::Money;

    #[tokio::test]
    async fn test_cashier_needs_open_session() {
        let state = test_state().await;
        let ana = actor(&state, "ana", false).await;
        let gate = state.gate();

        let decision = gate.check(state.db(), Some(&ana), "/pos/").await.unwrap();
        assert_eq!(
            decision,
            GateDecision::RedirectToOpenSession {
                location: "/pos/open-session/".to_string()
            }
        );

        let decision = gate
            .check(state.db(), Some(&ana), "/pos/open-session/")
            .await
            .unwrap();
        assert_eq!(decision, GateDecision::Allow);

        state
            .db()
            .sessions()
            .open(&ana.user_id, Money::from_cents(10000))
            .await
            .unwrap();
        let decision = gate.check(state.db(), Some(&ana), "/pos/").await.unwrap();
        assert_eq!(decision, GateDecision::Allow);
    }

    #[tokio::test]
    async fn test_admin_and_anonymous_pass() {
        let state = test_state().await;
        let root = actor(&state, "root", true).await;
        let gate = state.gate();

        assert_eq!(
            gate.check(state.db(), Some(&root), "/pos/").await.unwrap(),
            GateDecision::Allow
        );
        assert_eq!(
            gate.check(state.db(), None, "/pos/").await.unwrap(),
            GateDecision::Allow
        );
    }

    #[tokio::test]
    async fn test_landing() {
        let state = test_state().await;
        let root = actor(&state, "root", true).await;
        let ana = actor(&state, "ana", false).await;
        let gate = state.gate();

        let landing = gate.landing(state.db(), &root).await.unwrap();
        assert_eq!(landing.route, LandingRoute::Dashboard);
        assert_eq!(landing.location, "/pos/dashboard/");

        let landing = gate.landing(state.db(), &ana).await.unwrap();
        assert_eq!(landing.route, LandingRoute::OpenSession);

        state
            .db()
            .sessions()
            .open(&ana.user_id, Money::zero())
            .await
            .unwrap();
        let landing = gate.landing(state.db(), &ana).await.unwrap();
        assert_eq!(landing.route, LandingRoute::PosMain);
        assert_eq!(landing.location, "/pos/");
    }
}
