//! The HTTP transport reference implementation (§6): an axum router exposing
//! the canonical JSON-RPC call form and a query-string shorthand over the
//! Instantiation Service and Dispatcher.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod routes;
mod state;

pub use error::TransportHttpError;
pub use routes::router;
pub use state::AppState;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agent_dispatch::{Agent, Dispatcher, OperationResult};
    use agent_dispatch_macros::operation;
    use agent_instantiation::{AgentFactory, FactoryError, InstantiationService};
    use agent_primitives::AgentId;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;

    struct PingAgent;
    agent_dispatch::impl_agent!(PingAgent);

    #[operation(name = "ping")]
    async fn ping(_agent: &PingAgent, message: String) -> OperationResult<String> {
        Ok(message)
    }

    fn construct_ping(_params: Value) -> Result<Arc<dyn Agent>, FactoryError> {
        Ok(Arc::new(PingAgent))
    }

    inventory::submit! { AgentFactory::new("PingAgent", construct_ping) }

    async fn test_state() -> Arc<AppState> {
        let instantiation = InstantiationService::in_memory();
        instantiation
            .register(AgentId::new("A").unwrap(), "PingAgent", Value::Null)
            .await;
        Arc::new(AppState::new(instantiation, Dispatcher::new(), None))
    }

    #[tokio::test]
    async fn post_call_returns_rpc_envelope() {
        let app = router(test_state().await);
        let body = json!({"method": "ping", "params": {"message": "hi"}, "id": 1}).to_string();
        let request = Request::builder()
            .method("POST")
            .uri("/agents/A/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["result"], json!("hi"));
    }

    #[tokio::test]
    async fn get_call_returns_bare_result() {
        let app = router(test_state().await);
        let request = Request::builder()
            .method("GET")
            .uri("/agents/A/ping?message=hey")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\"hey\"");
    }

    #[tokio::test]
    async fn unknown_agent_is_404() {
        let app = router(test_state().await);
        let request = Request::builder()
            .method("POST")
            .uri("/agents/nobody/")
            .header("content-type", "application/json")
            .body(Body::from(json!({"method": "ping", "params": {}}).to_string()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
