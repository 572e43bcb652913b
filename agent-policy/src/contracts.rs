//! Authorization request contracts.

use std::collections::BTreeSet;

use agent_primitives::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Context carried alongside an authorization request: free-form metadata
/// and tags a rule can match on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorizationContext {
    metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,
}

impl AuthorizationContext {
    /// Inserts metadata into the context.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    /// Adds a tag, ignoring empty or whitespace-only strings.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        let tag = tag.into();
        if !tag.trim().is_empty() {
            self.tags.insert(tag);
        }
    }

    /// Extends the context with multiple tags.
    pub fn extend_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
    }

    /// Returns the metadata map.
    #[must_use]
    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Returns the tag set.
    #[must_use]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }
}

/// The (method name, sender identity) pair the Dispatcher asks an
/// authorizor about before invoking an operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    agent_id: AgentId,
    method: String,
    sender: Option<String>,
    #[serde(default)]
    context: AuthorizationContext,
}

impl AuthorizationRequest {
    /// Creates a request for `method` on `agent_id`, invoked by `sender`
    /// (the caller's self-reported identity, `None` for anonymous/internal
    /// callers such as the scheduler).
    #[must_use]
    pub fn new(agent_id: AgentId, method: impl Into<String>, sender: Option<String>) -> Self {
        Self {
            agent_id,
            method: method.into(),
            sender,
            context: AuthorizationContext::default(),
        }
    }

    /// Returns the target agent id.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the operation name being invoked.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the caller's self-reported identity, if any.
    #[must_use]
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    /// Returns the attached context.
    #[must_use]
    pub fn context(&self) -> &AuthorizationContext {
        &self.context
    }

    /// Returns a mutable reference to the context.
    pub fn context_mut(&mut self) -> &mut AuthorizationContext {
        &mut self.context
    }

    /// Attaches a tag and returns the updated request.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.context.add_tag(tag);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_dedupes_tags() {
        let mut ctx = AuthorizationContext::default();
        ctx.add_tag("alpha");
        ctx.add_tag("alpha");
        ctx.extend_tags(["beta", " ", "gamma"]);
        assert_eq!(ctx.tags().len(), 3);
    }

    #[test]
    fn request_builder_attaches_tags() {
        let agent = AgentId::new("restagent").unwrap();
        let request =
            AuthorizationRequest::new(agent, "ping", Some("caller".into())).with_tag("internal");
        assert_eq!(request.method(), "ping");
        assert_eq!(request.sender(), Some("caller"));
        assert!(request.context().tags().contains("internal"));
    }
}
