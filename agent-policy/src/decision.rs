//! Authorization decision type returned by an [`crate::Authorizor`].

use serde::{Deserialize, Serialize};

/// The outcome of an authorization check: a plain yes/no, per the
/// "authorizor is consulted with a yes/no question" contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationDecision {
    allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl AuthorizationDecision {
    /// Returns an allow decision.
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// Returns a deny decision with an explanatory reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }

    /// Returns `true` when the call is permitted.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    /// Returns the reason attached to a deny decision, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_helpers_work() {
        let allow = AuthorizationDecision::allow();
        assert!(allow.is_allowed());
        assert_eq!(allow.reason(), None);

        let deny = AuthorizationDecision::deny("blocked");
        assert!(!deny.is_allowed());
        assert_eq!(deny.reason(), Some("blocked"));
    }
}
