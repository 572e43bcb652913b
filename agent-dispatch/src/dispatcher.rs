//! The JSON-RPC Dispatcher (§4.2): resolves an operation by name, binds
//! parameters, consults the authorizor, and invokes the target.

use std::sync::Arc;

use agent_policy::{AuthorizationRequest, Authorizor};
use agent_primitives::{AgentId, RpcError, RpcErrorCode, RpcRequest, RpcResponse};

use crate::agent::Agent;
use crate::registry::annotated_class;

/// Stateless dispatcher: all of its state lives in the process-wide
/// reflection cache, so a single instance can be shared across every agent.
#[derive(Default)]
pub struct Dispatcher;

impl Dispatcher {
    /// Creates a new dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Dispatches `request` against `agent` (addressed as `agent_id`),
    /// optionally consulting `authorizor` with `(method, sender)` before
    /// invoking the operation.
    pub async fn dispatch(
        &self,
        agent_id: &AgentId,
        agent: &dyn Agent,
        request: RpcRequest,
        sender: Option<String>,
        authorizor: Option<&Arc<dyn Authorizor>>,
    ) -> RpcResponse {
        let id = request.id.clone();

        let class = annotated_class(agent.type_name());
        let Some(operation) = class.operation(&request.method) else {
            return RpcResponse::err(
                RpcError::new(
                    RpcErrorCode::MethodNotFound,
                    format!("no operation named `{}`", request.method),
                ),
                id,
            );
        };

        for param in operation.params() {
            if param.required() && !request.params_object().contains_key(param.name()) {
                return RpcResponse::err(
                    RpcError::new(
                        RpcErrorCode::InvalidParams,
                        format!("missing required parameter `{}`", param.name()),
                    ),
                    id,
                );
            }
        }

        if let Some(authorizor) = authorizor {
            let auth_request = AuthorizationRequest::new(
                agent_id.clone(),
                request.method.clone(),
                sender.clone(),
            );
            match authorizor.authorize(&auth_request).await {
                Ok(decision) if decision.is_allowed() => {}
                Ok(decision) => {
                    return RpcResponse::err(
                        RpcError::new(
                            RpcErrorCode::NotAuthorized,
                            decision.reason().unwrap_or("not authorized").to_owned(),
                        ),
                        id,
                    );
                }
                Err(err) => {
                    return RpcResponse::err(
                        RpcError::new(RpcErrorCode::InternalError, format!("authorizor failure: {err}")),
                        id,
                    );
                }
            }
        }

        match operation.invoke(agent, request.params_object()).await {
            Ok(value) => RpcResponse::ok(value, id),
            Err(error) => RpcResponse::err(error, id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_policy::{AuthorizationDecision, RuleBasedAuthorizor};
    use agent_dispatch_macros::operation;
    use serde_json::json;

    struct PingAgent;
    crate::impl_agent!(PingAgent);

    fn agent_id() -> AgentId {
        AgentId::new("ping-agent").unwrap()
    }

    /// Operation result alias, matching what `#[operation]` expects.
    type OperationResult<T> = Result<T, RpcError>;

    #[operation(name = "ping")]
    async fn ping(_agent: &PingAgent, message: String) -> OperationResult<String> {
        Ok(message)
    }

    #[operation(name = "greet")]
    async fn greet(_agent: &PingAgent, name: String, loud: Option<bool>) -> OperationResult<String> {
        let greeting = format!("hello, {name}");
        Ok(if loud.unwrap_or(false) {
            greeting.to_uppercase()
        } else {
            greeting
        })
    }

    #[tokio::test]
    async fn dispatches_to_registered_operation() {
        let agent = PingAgent;
        let dispatcher = Dispatcher::new();
        let request = RpcRequest::new("ping", json!({"message": "hi"}));

        let response = dispatcher.dispatch(&agent_id(), &agent, request, None, None).await;
        assert_eq!(response.result, Some(json!("hi")));
    }

    #[tokio::test]
    async fn missing_required_param_is_invalid_params() {
        let agent = PingAgent;
        let dispatcher = Dispatcher::new();
        let request = RpcRequest::new("ping", json!({}));

        let response = dispatcher.dispatch(&agent_id(), &agent, request, None, None).await;
        let error = response.error.expect("missing param should error");
        assert_eq!(error.code, RpcErrorCode::InvalidParams.as_i64());
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let agent = PingAgent;
        let dispatcher = Dispatcher::new();
        let request = RpcRequest::new("nonexistent", json!({}));

        let response = dispatcher.dispatch(&agent_id(), &agent, request, None, None).await;
        let error = response.error.expect("unknown method should error");
        assert_eq!(error.code, RpcErrorCode::MethodNotFound.as_i64());
    }

    #[tokio::test]
    async fn optional_param_defaults_when_absent() {
        let agent = PingAgent;
        let dispatcher = Dispatcher::new();
        let request = RpcRequest::new("greet", json!({"name": "ada"}));

        let response = dispatcher.dispatch(&agent_id(), &agent, request, None, None).await;
        assert_eq!(response.result, Some(json!("hello, ada")));
    }

    #[tokio::test]
    async fn denied_authorization_short_circuits_invocation() {
        let agent = PingAgent;
        let dispatcher = Dispatcher::new();
        let authorizor: Arc<dyn Authorizor> =
            Arc::new(RuleBasedAuthorizor::new(AuthorizationDecision::deny("no")));
        let request = RpcRequest::new("ping", json!({"message": "hi"}));

        let response = dispatcher.dispatch(&agent_id(), &agent, request, None, Some(&authorizor)).await;
        let error = response.error.expect("denied call should error");
        assert_eq!(error.code, RpcErrorCode::NotAuthorized.as_i64());
    }
}
