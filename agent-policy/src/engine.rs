//! The Authorizor capability and a rule-based reference implementation.

use std::collections::BTreeSet;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::contracts::AuthorizationRequest;
use crate::decision::AuthorizationDecision;

/// Errors surfaced by an authorizor.
#[derive(Debug, Error)]
pub enum AuthorizorError {
    /// Rule configuration error.
    #[error("invalid authorization rule: {0}")]
    InvalidRule(&'static str),
    /// Backend integration returned an error.
    #[error("authorizor backend failure: {reason}")]
    Backend {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
}

/// Result alias for authorizor operations.
pub type AuthorizorResult<T> = Result<T, AuthorizorError>;

/// The pluggable yes/no predicate the Dispatcher consults before invoking an
/// operation whose agent has an authorizor configured.
#[async_trait]
pub trait Authorizor: Send + Sync {
    /// Evaluates whether the call described by `request` may proceed.
    async fn authorize(&self, request: &AuthorizationRequest) -> AuthorizorResult<AuthorizationDecision>;
}

/// Matches a request's operation name, optionally narrowed by required tags.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    method: MethodMatcher,
    required_tags: BTreeSet<String>,
}

impl RuleMatcher {
    /// Matches every operation.
    #[must_use]
    pub fn any() -> Self {
        Self {
            method: MethodMatcher::Any,
            required_tags: BTreeSet::new(),
        }
    }

    /// Matches a single named operation.
    #[must_use]
    pub fn for_method(name: impl Into<String>) -> Self {
        Self {
            method: MethodMatcher::Named(name.into()),
            required_tags: BTreeSet::new(),
        }
    }

    /// Requires that the request carries the supplied tags.
    #[must_use]
    pub fn with_required_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            let tag = tag.into();
            if !tag.trim().is_empty() {
                self.required_tags.insert(tag);
            }
        }
        self
    }

    fn matches(&self, request: &AuthorizationRequest) -> bool {
        self.method.matches(request.method())
            && self
                .required_tags
                .iter()
                .all(|tag| request.context().tags().contains(tag))
    }
}

/// Matches a request by operation name.
#[derive(Debug, Clone)]
enum MethodMatcher {
    Any,
    Named(String),
}

impl MethodMatcher {
    fn matches(&self, method: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Named(expected) => expected == method,
        }
    }
}

/// Rule consisting of a matcher and a resulting decision.
#[derive(Debug, Clone)]
pub struct AuthorizationRule {
    name: String,
    matcher: RuleMatcher,
    decision: AuthorizationDecision,
}

impl AuthorizationRule {
    /// Creates a new rule with the supplied matcher and decision.
    ///
    /// # Errors
    ///
    /// Returns [`AuthorizorError::InvalidRule`] when the rule name is empty.
    pub fn new(
        name: impl Into<String>,
        matcher: RuleMatcher,
        decision: AuthorizationDecision,
    ) -> AuthorizorResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(AuthorizorError::InvalidRule("rule name cannot be empty"));
        }

        Ok(Self {
            name,
            matcher,
            decision,
        })
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, request: &AuthorizationRequest) -> bool {
        self.matcher.matches(request)
    }
}

/// In-memory, first-match-wins rule-based authorizor.
#[derive(Debug)]
pub struct RuleBasedAuthorizor {
    rules: RwLock<Vec<AuthorizationRule>>,
    default_decision: AuthorizationDecision,
}

impl RuleBasedAuthorizor {
    /// Constructs a new authorizor with the provided default decision,
    /// applied when no rule matches.
    #[must_use]
    pub fn new(default_decision: AuthorizationDecision) -> Self {
        Self {
            rules: RwLock::new(Vec::new()),
            default_decision,
        }
    }

    /// Adds a rule to the engine in insertion order.
    ///
    /// # Panics
    ///
    /// Panics if the internal rule store lock has been poisoned.
    pub fn add_rule(&self, rule: AuthorizationRule) {
        let mut guard = self.rules.write().expect("authorization rules poisoned");
        guard.push(rule);
    }
}

#[async_trait]
impl Authorizor for RuleBasedAuthorizor {
    async fn authorize(
        &self,
        request: &AuthorizationRequest,
    ) -> AuthorizorResult<AuthorizationDecision> {
        let guard = self.rules.read().expect("authorization rules poisoned");
        for rule in guard.iter() {
            if rule.matches(request) {
                debug!(rule = rule.name(), method = request.method(), "authorization rule matched");
                return Ok(rule.decision.clone());
            }
        }

        Ok(self.default_decision.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_primitives::AgentId;

    fn request_for(method: &str) -> AuthorizationRequest {
        AuthorizationRequest::new(AgentId::new("restagent").unwrap(), method, Some("caller".into()))
    }

    #[tokio::test]
    async fn rule_matching_prefers_first_match() {
        let authorizor = RuleBasedAuthorizor::new(AuthorizationDecision::allow());
        authorizor.add_rule(
            AuthorizationRule::new(
                "deny-put",
                RuleMatcher::for_method("put"),
                AuthorizationDecision::deny("method disabled"),
            )
            .unwrap(),
        );

        let decision = authorizor.authorize(&request_for("put")).await.unwrap();
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason(), Some("method disabled"));

        let decision = authorizor.authorize(&request_for("get")).await.unwrap();
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn default_decision_applies_when_no_rules_match() {
        let authorizor = RuleBasedAuthorizor::new(AuthorizationDecision::deny("no rules"));
        let decision = authorizor.authorize(&request_for("unknown")).await.unwrap();
        assert!(!decision.is_allowed());
    }

    #[tokio::test]
    async fn tag_matching_requires_subset() {
        let authorizor = RuleBasedAuthorizor::new(AuthorizationDecision::allow());
        let matcher = RuleMatcher::any().with_required_tags(["cap:write".to_owned()]);
        authorizor.add_rule(
            AuthorizationRule::new("cap-required", matcher, AuthorizationDecision::deny("needs cap:write"))
                .unwrap(),
        );

        let mut request = request_for("write");
        request.context_mut().extend_tags(["cap:write"]);
        let decision = authorizor.authorize(&request).await.unwrap();
        assert!(!decision.is_allowed());

        let request = request_for("write");
        let decision = authorizor.authorize(&request).await.unwrap();
        assert!(decision.is_allowed());
    }
}
