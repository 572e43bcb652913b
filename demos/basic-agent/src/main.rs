//! Runnable demo: loads a handful of agent configs, boots them through the
//! Instantiation Service, and serves them over HTTP.
//!
//! ```sh
//! cargo run -p basic-agent-demo
//! curl -X POST localhost:8080/agents/echo-1/ -d '{"method":"ping","params":{"message":"hi"}}'
//! curl localhost:8080/agents/counter-1/increment?by=3
//! ```

mod agents;
mod router;

use std::path::PathBuf;
use std::sync::Arc;

use agent_dispatch::Dispatcher;
use agent_instantiation::InstantiationService;
use agent_kernel::{Host, Transport, TransportError, WorkerPoolConfig};
use agent_primitives::{AgentId, RpcRequest};
use agent_state::InMemoryStateService;
use agent_transport::AppState;
use async_trait::async_trait;
use tracing::{info, warn};

/// All agents in this demo are hosted locally; a deployment with peers
/// would replace this with a real wire transport.
struct NoPeersTransport;

#[async_trait]
impl Transport for NoPeersTransport {
    async fn dispatch(&self, target_url: &str, _request: RpcRequest, _tag: String) -> Result<(), TransportError> {
        Err(TransportError {
            reason: format!("no route to {target_url}: this demo has no configured peers"),
        })
    }
}

#[tokio::main]
async fn main() {
    agent_telemetry::init_tracing();

    let instantiation = InstantiationService::new(None, WorkerPoolConfig::default());
    let dispatcher = Dispatcher::new();

    agents::install_counter_state(Arc::new(InMemoryStateService::new()));

    let config_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config");
    let outcome = agent_config::load_dir(&config_dir).await;
    for failure in &outcome.failures {
        warn!(path = %failure.path.display(), error = %failure.error, "skipping malformed agent config");
    }
    for entry in outcome.entries {
        let Some(raw_id) = entry.id else {
            warn!(class_name = %entry.class_name, "skipping config with no id");
            continue;
        };
        let Ok(agent_id) = AgentId::new(raw_id.clone()) else {
            warn!(id = %raw_id, "skipping config with an invalid id");
            continue;
        };
        info!(agent_id = %agent_id, class_name = %entry.class_name, "registering agent");
        instantiation.register(agent_id, entry.class_name, entry.params).await;
    }

    // No persistence configured in this demo, so `boot()` is a no-op; agents
    // wake lazily on first call instead.
    instantiation.boot().await;

    let router = Arc::new(router::AgentRouter::new(
        instantiation.clone(),
        Dispatcher::new(),
        None,
    ));
    let _host = Arc::new(Host::new(router, Arc::new(NoPeersTransport)));

    let state = Arc::new(AppState::new(instantiation, dispatcher, None));
    let app = agent_transport::router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .expect("failed to bind demo listener");
    info!(addr = %listener.local_addr().unwrap(), "basic-agent-demo listening");
    axum::serve(listener, app).await.expect("server error");
}
