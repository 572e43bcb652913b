//! The HTTP call surface (§6): `POST /agents/{agentId}/` as the canonical
//! JSON-RPC form, `GET /agents/{agentId}/{method}` as a query-string
//! shorthand.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Map, Value};
use tower_http::trace::TraceLayer;

use agent_primitives::{AgentId, RpcRequest, RpcResponse};

use crate::error::TransportHttpError;
use crate::state::AppState;

/// Builds the router, wiring both call forms against `state`.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/agents/{agent_id}/", post(call_handler))
        .route("/agents/{agent_id}/{method}", get(query_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn resolve_agent(
    state: &AppState,
    raw_id: &str,
) -> Result<(AgentId, Arc<dyn agent_dispatch::Agent>), TransportHttpError> {
    let agent_id = AgentId::new(raw_id).map_err(|err| TransportHttpError::BadRequest(err.to_string()))?;
    let agent = state
        .instantiation
        .init(&agent_id)
        .await
        .ok_or_else(|| TransportHttpError::AgentNotFound(agent_id.to_string()))?;
    Ok((agent_id, agent))
}

/// `POST /agents/{agentId}/`: the canonical JSON-RPC call form. Always
/// responds `200 OK` with a JSON-RPC envelope once the agent is resolved;
/// dispatch-level failures (bad params, unknown method, ...) are carried in
/// the envelope's `error` field, not the HTTP status.
async fn call_handler(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(request): Json<RpcRequest>,
) -> Result<Json<RpcResponse>, TransportHttpError> {
    let (agent_id, agent) = resolve_agent(&state, &agent_id).await?;
    let response = state
        .dispatcher
        .dispatch(&agent_id, agent.as_ref(), request, None, state.authorizor.as_ref())
        .await;
    Ok(Json(response))
}

/// `GET /agents/{agentId}/{method}?k1=v1&k2=v2`: synthesizes
/// `{method, params: {k1: v1, ...}}`. The body is the JSON-encoded `result`
/// on success, or the plain error message on failure.
async fn query_handler(
    State(state): State<Arc<AppState>>,
    Path((agent_id, method)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, TransportHttpError> {
    let (agent_id, agent) = resolve_agent(&state, &agent_id).await?;

    let params_object: Map<String, Value> = params
        .into_iter()
        .map(|(key, value)| (key, Value::String(value)))
        .collect();
    let request = RpcRequest::new(method, Value::Object(params_object));

    let response = state
        .dispatcher
        .dispatch(&agent_id, agent.as_ref(), request, None, state.authorizor.as_ref())
        .await;

    Ok(match response.result {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => {
            let message = response.error.map(|error| error.message).unwrap_or_default();
            (StatusCode::OK, message).into_response()
        }
    })
}
