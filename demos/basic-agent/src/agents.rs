//! Two small agent types wired through the reflection-driven dispatcher:
//! an `EchoAgent` with no state, and a `CounterAgent` backed by the shared
//! [`agent_state::StateService`].

use std::sync::{Arc, OnceLock};

use agent_dispatch::{Agent, OperationResult};
use agent_dispatch_macros::operation;
use agent_instantiation::{AgentFactory, FactoryError};
use agent_primitives::{RpcError, RpcErrorCode};
use agent_state::StateService;
use serde_json::Value;

static COUNTER_STATE: OnceLock<Arc<dyn StateService>> = OnceLock::new();

/// Installs the backend `CounterAgent` instances read and write through.
/// Must be called once before any `CounterAgent` is woken.
pub fn install_counter_state(state: Arc<dyn StateService>) {
    let _ = COUNTER_STATE.set(state);
}

fn counter_state() -> Result<&'static Arc<dyn StateService>, RpcError> {
    COUNTER_STATE
        .get()
        .ok_or_else(|| RpcError::new(RpcErrorCode::InternalError, "counter state backend not installed"))
}

/// Replies with whatever message it's given.
pub struct EchoAgent;
agent_dispatch::impl_agent!(EchoAgent);

#[operation(name = "ping")]
async fn ping(_agent: &EchoAgent, message: String) -> OperationResult<String> {
    Ok(message)
}

fn construct_echo(_params: Value) -> Result<Arc<dyn Agent>, FactoryError> {
    Ok(Arc::new(EchoAgent))
}

inventory::submit! { AgentFactory::new("EchoAgent", construct_echo) }

/// A counter keyed by its own agent id in the shared state backend.
pub struct CounterAgent {
    state_key: String,
}

agent_dispatch::impl_agent!(CounterAgent);

#[operation(name = "increment")]
async fn increment(agent: &CounterAgent, by: Option<i64>) -> OperationResult<i64> {
    let store = counter_state()?;
    let current = store
        .get(&agent.state_key)
        .await
        .map_err(|err| RpcError::new(RpcErrorCode::InternalError, err.to_string()))?
        .and_then(|value| value.as_i64())
        .unwrap_or(0);
    let next = current + by.unwrap_or(1);
    store
        .put(&agent.state_key, Value::from(next))
        .await
        .map_err(|err| RpcError::new(RpcErrorCode::InternalError, err.to_string()))?;
    Ok(next)
}

#[operation(name = "get")]
async fn get(agent: &CounterAgent) -> OperationResult<i64> {
    let store = counter_state()?;
    let current = store
        .get(&agent.state_key)
        .await
        .map_err(|err| RpcError::new(RpcErrorCode::InternalError, err.to_string()))?
        .and_then(|value| value.as_i64())
        .unwrap_or(0);
    Ok(current)
}

fn construct_counter(params: Value) -> Result<Arc<dyn Agent>, FactoryError> {
    let self_id = params
        .get("selfId")
        .and_then(Value::as_str)
        .ok_or_else(|| FactoryError::new("CounterAgent params must carry `selfId`"))?;
    Ok(Arc::new(CounterAgent {
        state_key: format!("counter:{self_id}"),
    }))
}

inventory::submit! { AgentFactory::new("CounterAgent", construct_counter) }
