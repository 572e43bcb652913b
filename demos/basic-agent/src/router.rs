//! Bridges the kernel's [`Receiver`] trait (what the Host, the scheduler,
//! and the event bus all call to deliver a self-addressed request) to the
//! Instantiation Service and Dispatcher, so self-calls and HTTP calls run
//! through the exact same resolution and dispatch path.

use std::sync::Arc;

use agent_dispatch::Dispatcher;
use agent_instantiation::InstantiationService;
use agent_kernel::Receiver;
use agent_policy::Authorizor;
use agent_primitives::{AgentId, RpcError, RpcErrorCode, RpcRequest, RpcResponse};
use async_trait::async_trait;

/// Resolves an agent via the Instantiation Service, then dispatches.
pub struct AgentRouter {
    instantiation: InstantiationService,
    dispatcher: Dispatcher,
    authorizor: Option<Arc<dyn Authorizor>>,
}

impl AgentRouter {
    /// Builds a router over the given services.
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

#[async_trait]
impl Receiver for AgentRouter {
    async fn receive(&self, agent_id: &AgentId, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let Some(agent) = self.instantiation.init(agent_id).await else {
            return RpcResponse::err(
                RpcError::new(RpcErrorCode::NotFound, format!("no such agent `{agent_id}`")),
                id,
            );
        };
        self.dispatcher
            .dispatch(agent_id, agent.as_ref(), request, None, self.authorizor.as_ref())
            .await
    }
}
