//! The Authorizor capability: a pluggable yes/no predicate the Dispatcher
//! consults before invoking an operation, plus a rule-based reference
//! implementation.

#![warn(missing_docs, clippy::pedantic)]

mod contracts;
mod decision;
mod engine;

pub use contracts::{AuthorizationContext, AuthorizationRequest};
pub use decision::AuthorizationDecision;
pub use engine::{
    Authorizor, AuthorizationRule, AuthorizorError, AuthorizorResult, RuleBasedAuthorizor,
    RuleMatcher,
};
