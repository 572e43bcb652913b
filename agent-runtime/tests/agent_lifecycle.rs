//! End-to-end scenarios spanning the Instantiation Service, Dispatcher,
//! Agent Host, scheduler, and event bus together — each individual crate's
//! own unit tests cover these pieces in isolation, but not in combination.

use std::sync::Arc;
use std::time::Duration;

use agent_runtime::dispatch::{Agent, Dispatcher, OperationResult};
use agent_runtime::dispatch_macros::operation;
use agent_runtime::events::EventBus;
use agent_runtime::instantiation::{AgentFactory, FactoryError, InstantiationService};
use agent_runtime::kernel::{DelayedTaskScheduler, Host, Receiver, Transport, TransportError};
use agent_runtime::primitives::{AgentId, RpcError, RpcRequest, RpcResponse};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

struct GreeterAgent {
    seen: Mutex<Vec<String>>,
}
agent_runtime::dispatch::impl_agent!(GreeterAgent);

#[operation(name = "ping")]
async fn ping(agent: &GreeterAgent, message: String) -> OperationResult<String> {
    agent.seen.lock().await.push(message.clone());
    Ok(message)
}

#[operation(name = "history")]
async fn history(agent: &GreeterAgent) -> OperationResult<Vec<String>> {
    Ok(agent.seen.lock().await.clone())
}

fn construct_greeter(_params: Value) -> Result<Arc<dyn Agent>, FactoryError> {
    Ok(Arc::new(GreeterAgent { seen: Mutex::new(Vec::new()) }))
}

inventory::submit! { AgentFactory::new("GreeterAgent", construct_greeter) }

/// Bridges the kernel's `Receiver` to the Instantiation Service + Dispatcher,
/// the same shape `demos/basic-agent`'s own router uses.
struct TestRouter {
    instantiation: InstantiationService,
    dispatcher: Dispatcher,
}

#[async_trait]
impl Receiver for TestRouter {
    async fn receive(&self, agent_id: &AgentId, request: RpcRequest) -> RpcResponse {
        let id = request.id.clone();
        let Some(agent) = self.instantiation.init(agent_id).await else {
            return RpcResponse::err(
                RpcError::new(agent_runtime::primitives::RpcErrorCode::NotFound, "no such agent"),
                id,
            );
        };
        self.dispatcher.dispatch(agent_id, agent.as_ref(), request, None, None).await
    }
}

struct NoPeersTransport;

#[async_trait]
impl Transport for NoPeersTransport {
    async fn dispatch(&self, target_url: &str, _request: RpcRequest, _tag: String) -> Result<(), TransportError> {
        Err(TransportError {
            reason: format!("no route to {target_url}"),
        })
    }
}

fn build_host() -> (Arc<Host>, Arc<TestRouter>, InstantiationService) {
    let instantiation = InstantiationService::in_memory();
    let router = Arc::new(TestRouter {
        instantiation: instantiation.clone(),
        dispatcher: Dispatcher::new(),
    });
    let host = Arc::new(Host::new(Arc::clone(&router) as Arc<dyn Receiver>, Arc::new(NoPeersTransport)));
    (host, router, instantiation)
}

#[tokio::test]
async fn self_call_is_visible_within_the_same_request_thread() {
    let (host, _router, instantiation) = build_host();
    let agent_id = AgentId::new("greeter-1").unwrap();
    instantiation.register(agent_id.clone(), "GreeterAgent", Value::Null).await;

    let target = format!("agent:{agent_id}");
    host.send(&target, "ping", json!({"message": "one"}), None).await.unwrap();
    host.send(&target, "ping", json!({"message": "two"}), None).await.unwrap();

    let history = host.send(&target, "history", Value::Null, None).await.unwrap();
    assert_eq!(history, json!(["one", "two"]));
}

#[tokio::test]
async fn scheduled_self_rpc_fires_and_can_be_canceled() {
    let (host, router, instantiation) = build_host();
    let agent_id = AgentId::new("greeter-2").unwrap();
    instantiation.register(agent_id.clone(), "GreeterAgent", Value::Null).await;
    // Wake it once so the scheduler's receiver has something to call into.
    host.receive(&agent_id, RpcRequest::new("ping", json!({"message": "warm"}))).await;

    let scheduler = DelayedTaskScheduler::start(agent_id.clone(), router as Arc<dyn Receiver>, None).await;

    scheduler
        .create_task(RpcRequest::new("ping", json!({"message": "scheduled"})), Duration::from_millis(20))
        .await;
    let canceled_id = scheduler
        .create_task(RpcRequest::new("ping", json!({"message": "canceled"})), Duration::from_millis(20))
        .await;
    scheduler.cancel_task(&canceled_id).await;

    tokio::time::sleep(Duration::from_millis(80)).await;
    scheduler.shutdown();

    let history = host
        .send(&format!("agent:{agent_id}"), "history", Value::Null, None)
        .await
        .unwrap();
    assert_eq!(history, json!(["warm", "scheduled"]));
}

#[tokio::test]
async fn event_trigger_fans_out_to_subscribers() {
    let (host, _router, instantiation) = build_host();
    let publisher = AgentId::new("publisher").unwrap();
    let subscriber = AgentId::new("subscriber").unwrap();
    instantiation.register(publisher.clone(), "GreeterAgent", Value::Null).await;
    instantiation.register(subscriber.clone(), "GreeterAgent", Value::Null).await;

    let bus = EventBus::new(host.clone());
    bus.subscribe(&publisher, format!("agent:{subscriber}"), "updated", "ping").await;

    bus.trigger(&publisher, "updated", json!({"message": "event-fired"})).await;

    let history = host
        .send(&format!("agent:{subscriber}"), "history", Value::Null, None)
        .await
        .unwrap();
    assert_eq!(history, json!(["event-fired"]));
}

#[tokio::test]
async fn required_param_missing_surfaces_as_invalid_params() {
    let (host, _router, instantiation) = build_host();
    let agent_id = AgentId::new("greeter-3").unwrap();
    instantiation.register(agent_id.clone(), "GreeterAgent", Value::Null).await;

    let err = host
        .send(&format!("agent:{agent_id}"), "ping", Value::Null, None)
        .await
        .unwrap_err();

    match err {
        agent_runtime::kernel::HostError::Remote(rpc_error) => {
            assert_eq!(rpc_error.code, agent_runtime::primitives::RpcErrorCode::InvalidParams.as_i64());
        }
        other => panic!("expected a remote RPC error, got {other:?}"),
    }
}
