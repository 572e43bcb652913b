//! Class resolution: the default mechanism the Instantiation Service uses to
//! turn a `className` string into a live agent instance.
//!
//! Rust has no runtime class loader, so resolution is realized the same way
//! the Dispatcher's reflection cache is: a declarative, `inventory`-collected
//! table. Each agent type registers a factory once, at link time, keyed by
//! its class name; `init` looks the name up and calls it with the stored
//! params.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use agent_dispatch::Agent;

/// Failure constructing an instance from its stored params.
#[derive(Debug, Error)]
#[error("failed to construct agent: {reason}")]
pub struct FactoryError {
    /// Human-readable explanation, usually a `serde_json` decode failure.
    pub reason: String,
}

impl FactoryError {
    /// Builds a [`FactoryError`] from anything stringifiable.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Constructs a fresh instance of one agent class from its JSON params.
pub type AgentConstructor = fn(Value) -> Result<Arc<dyn Agent>, FactoryError>;

/// Registration submitted by an agent type, associating its class name with
/// the function that constructs it. Submit with
/// `inventory::submit! { AgentFactory::new("ClassName", construct_fn) }`.
pub struct AgentFactory {
    class_name: &'static str,
    construct: AgentConstructor,
}

impl AgentFactory {
    /// Creates a factory registration for `class_name`.
    #[must_use]
    pub const fn new(class_name: &'static str, construct: AgentConstructor) -> Self {
        Self {
            class_name,
            construct,
        }
    }

    /// Returns the class name this factory constructs.
    #[must_use]
    pub const fn class_name(&self) -> &'static str {
        self.class_name
    }

    /// Constructs an instance from `params`.
    ///
    /// # Errors
    ///
    /// Returns whatever [`FactoryError`] the registered constructor produces,
    /// typically a params decode failure.
    pub fn construct(&self, params: Value) -> Result<Arc<dyn Agent>, FactoryError> {
        (self.construct)(params)
    }
}

inventory::collect!(AgentFactory);

/// Looks up the factory registered for `class_name`, if any.
#[must_use]
pub fn resolve_class(class_name: &str) -> Option<&'static AgentFactory> {
    inventory::iter::<AgentFactory>
        .into_iter()
        .find(|factory| factory.class_name == class_name)
}
