//! Shared state handed to every route handler.

use std::sync::Arc;

use agent_dispatch::Dispatcher;
use agent_instantiation::InstantiationService;
use agent_policy::Authorizor;

/// Everything an HTTP handler needs to resolve an agent and dispatch a
/// request against it.
pub struct AppState {
    /// Resolves and lazily constructs the target agent.
    pub instantiation: InstantiationService,
    /// Resolves the method and invokes it on the resolved agent.
    pub dispatcher: Dispatcher,
    /// Optional authorizor consulted before every dispatch.
    pub authorizor: Option<Arc<dyn Authorizor>>,
}

impl AppState {
    /// Builds shared state from its constituent services.
    #[must_use]
    pub fn new(
        instantiation: InstantiationService,
        dispatcher: Dispatcher,
        authorizor: Option<Arc<dyn Authorizor>>,
    ) -> Self {
        Self {
            instantiation,
            dispatcher,
            authorizor,
        }
    }
}
