//! # Access Gate Policy
//!
//! Decides whether a request into the POS area may proceed or must be sent
//! to the open-session screen first.
//!
//! ## Decision Table
//! ```text
//! ┌──────────────────────────┬──────────────────────┬────────────────────┐
//! │ Request                  │ Condition            │ Decision           │
//! ├──────────────────────────┼──────────────────────┼────────────────────┤
//! │ anonymous                │ -                    │ Allow (auth layer  │
//! │                          │                      │ handles it)        │
//! │ admin                    │ -                    │ Allow              │
//! │ path outside POS prefix  │ -                    │ Allow              │
//! │ allow-listed path        │ open-session, login, │ Allow              │
//! │                          │ logout               │                    │
//! │ cashier, POS path        │ has open session     │ Allow              │
//! │ cashier, POS path        │ no open session      │ RedirectToOpen...  │
//! └──────────────────────────┴──────────────────────┴────────────────────┘
//! ```
//!
//! The policy is pure. Looking up the active session is the caller's job,
//! and [`GatePolicy::requires_session`] tells it when that lookup is needed.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Actor;

/// Outcome of the gate for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GateDecision {
    Allow,
    RedirectToOpenSession { location: String },
}

/// Where a user lands right after logging in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum LandingRoute {
    Dashboard,
    PosMain,
    OpenSession,
}

/// Route configuration of the gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    /// Paths under this prefix belong to the POS area.
    pub pos_prefix: String,
    /// POS-area paths reachable without an open session.
    pub allow_list: Vec<String>,
    pub open_session_path: String,
    pub dashboard_path: String,
}

impl Default for GatePolicy {
    fn default() -> Self {
        GatePolicy {
            pos_prefix: "/pos/".to_string(),
            allow_list: vec![
                "/pos/open-session/".to_string(),
                "/pos/login/".to_string(),
                "/pos/logout/".to_string(),
            ],
            open_session_path: "/pos/open-session/".to_string(),
            dashboard_path: "/pos/dashboard/".to_string(),
        }
    }
}

impl GatePolicy {
    /// True when the decision for this request depends on whether the
    /// actor holds an open session.
    pub fn requires_session(&self, actor: Option<&Actor>, path: &str) -> bool {
        let Some(actor) = actor else {
            return false;
        };
        if actor.is_admin {
            return false;
        }
        self.is_pos_path(path) && !self.is_allow_listed(path)
    }

    /// Decides a request given whether the actor has an open session.
    ///
    /// ## Example
    /// ```rust
    /// use ferre_core::{Actor, GateDecision, GatePolicy};
    ///
    /// let policy = GatePolicy::default();
    /// let cashier = Actor { user_id: "u1".into(), username: "ana".into(), is_admin: false };
    ///
    /// assert_eq!(policy.decide(Some(&cashier), "/pos/", true), GateDecision::Allow);
    /// assert!(matches!(
    ///     policy.decide(Some(&cashier), "/pos/", false),
    ///     GateDecision::RedirectToOpenSession { .. }
    /// ));
    /// assert_eq!(policy.decide(Some(&cashier), "/pos/open-session/", false), GateDecision::Allow);
    /// ```
    pub fn decide(&self, actor: Option<&Actor>, path: &str, has_open_session: bool) -> GateDecision {
        if self.requires_session(actor, path) && !has_open_session {
            GateDecision::RedirectToOpenSession {
                location: self.open_session_path.clone(),
            }
        } else {
            GateDecision::Allow
        }
    }

    /// Post-login destination.
    pub fn landing(&self, actor: &Actor, has_open_session: bool) -> LandingRoute {
        if actor.is_admin {
            LandingRoute::Dashboard
        } else if has_open_session {
            LandingRoute::PosMain
        } else {
            LandingRoute::OpenSession
        }
    }

    /// Path for a landing route.
    pub fn landing_path(&self, route: LandingRoute) -> &str {
        match route {
            LandingRoute::Dashboard => &self.dashboard_path,
            LandingRoute::PosMain => &self.pos_prefix,
            LandingRoute::OpenSession => &self.open_session_path,
        }
    }

    fn is_pos_path(&self, path: &str) -> bool {
        let prefix = trim_slash(&self.pos_prefix);
        let path = trim_slash(path);
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    fn is_allow_listed(&self, path: &str) -> bool {
        let path = trim_slash(path);
        self.allow_list.iter().any(|allowed| trim_slash(allowed) == path)
    }
}

// "/pos/" and "/pos" name the same route.
fn trim_slash(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cashier() -> Actor {
        Actor {
            user_id: "u1".to_string(),
            username: "ana".to_string(),
            is_admin: false,
        }
    }

    fn admin() -> Actor {
        Actor {
            user_id: "u0".to_string(),
            username: "root".to_string(),
            is_admin: true,
        }
    }

    #[test]
    fn test_cashier_without_session_is_redirected() {
        let policy = GatePolicy::default();
        let decision = policy.decide(Some(&cashier()), "/pos/checkout/", false);
        assert_eq!(
            decision,
            GateDecision::RedirectToOpenSession {
                location: "/pos/open-session/".to_string()
            }
        );
    }

    #[test]
    fn test_allow_listed_paths_pass() {
        let policy = GatePolicy::default();
        for path in ["/pos/open-session/", "/pos/login", "/pos/logout/"] {
            assert_eq!(policy.decide(Some(&cashier()), path, false), GateDecision::Allow);
        }
    }

    #[test]
    fn test_admin_and_anonymous_bypass() {
        let policy = GatePolicy::default();
        assert!(!policy.requires_session(Some(&admin()), "/pos/"));
        assert!(!policy.requires_session(None, "/pos/"));
        assert_eq!(policy.decide(None, "/pos/", false), GateDecision::Allow);
    }

    #[test]
    fn test_paths_outside_prefix_pass() {
        let policy = GatePolicy::default();
        assert!(!policy.requires_session(Some(&cashier()), "/admin/"));
        assert!(!policy.requires_session(Some(&cashier()), "/position/"));
        assert!(policy.requires_session(Some(&cashier()), "/pos"));
        assert!(policy.requires_session(Some(&cashier()), "/pos/add-product/"));
    }

    #[test]
    fn test_landing() {
        let policy = GatePolicy::default();
        assert_eq!(policy.landing(&admin(), false), LandingRoute::Dashboard);
        assert_eq!(policy.landing(&cashier(), true), LandingRoute::PosMain);
        assert_eq!(policy.landing(&cashier(), false), LandingRoute::OpenSession);
        assert_eq!(policy.landing_path(LandingRoute::PosMain), "/pos/");
    }
}
