//! The Event Bus (§4.5): `subscribe`/`unsubscribe`/`trigger`, with one
//! subscription table per publisher agent.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::warn;

use agent_kernel::Host;
use agent_primitives::AgentId;

use crate::subscription::{Subscription, SubscriptionTable};

/// Coordinates per-publisher subscription tables and fans `trigger` calls
/// out to matching subscribers through a [`Host`].
pub struct EventBus {
    host: Arc<Host>,
    tables: Mutex<HashMap<AgentId, Arc<SubscriptionTable>>>,
}

impl EventBus {
    /// Creates an event bus that delivers through `host`.
    #[must_use]
    pub fn new(host: Arc<Host>) -> Self {
        Self {
            host,
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `(subscriber_url, event, callback_method)` to `publisher`'s
    /// subscription table. Duplicates collapse to one entry.
    pub async fn subscribe(
        &self,
        publisher: &AgentId,
        subscriber_url: impl Into<String>,
        event: impl Into<String>,
        callback_method: impl Into<String>,
    ) {
        let table = self.table_for(publisher).await;
        table
            .subscribe(Subscription {
                subscriber_url: subscriber_url.into(),
                event: event.into(),
                callback_method: callback_method.into(),
            })
            .await;
    }

    /// Removes a subscription. Idempotent.
    pub async fn unsubscribe(
        &self,
        publisher: &AgentId,
        subscriber_url: impl Into<String>,
        event: impl Into<String>,
        callback_method: impl Into<String>,
    ) {
        let table = self.table_for(publisher).await;
        table
            .unsubscribe(&Subscription {
                subscriber_url: subscriber_url.into(),
                event: event.into(),
                callback_method: callback_method.into(),
            })
            .await;
    }

    /// Invokes every subscription matching `event` on `publisher`'s table,
    /// concurrently, passing `{agent, event, params}`. A subscriber whose
    /// delivery fails is logged and skipped; it does not delay or cancel
    /// delivery to the others, and its subscription is left in place.
    pub async fn trigger(&self, publisher: &AgentId, event: &str, params: Value) {
        let table = self.table_for(publisher).await;
        let matching = table.matching(event).await;
        if matching.is_empty() {
            return;
        }

        let payload = json!({
            "agent": publisher.to_string(),
            "event": event,
            "params": params,
        });

        let mut handles = Vec::with_capacity(matching.len());
        for subscription in matching {
            let host = Arc::clone(&self.host);
            let payload = payload.clone();
            let publisher = publisher.clone();
            handles.push(tokio::spawn(async move {
                let outcome = host
                    .send(&subscription.subscriber_url, &subscription.callback_method, payload, None)
                    .await;
                if let Err(err) = outcome {
                    warn!(
                        publisher = %publisher,
                        subscriber = %subscription.subscriber_url,
                        event,
                        error = %err,
                        "event delivery failed"
                    );
                }
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }
    }

    async fn table_for(&self, publisher: &AgentId) -> Arc<SubscriptionTable> {
        let mut guard = self.tables.lock().await;
        Arc::clone(
            guard
                .entry(publisher.clone())
                .or_insert_with(|| Arc::new(SubscriptionTable::new())),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use agent_kernel::{Receiver, TransportError};
    use agent_primitives::{RpcRequest, RpcResponse};

    use super::*;

    struct NullTransport;
    #[async_trait]
    impl agent_kernel::Transport for NullTransport {
        async fn dispatch(&self, _target_url: &str, _request: RpcRequest, _tag: String) -> Result<(), TransportError> {
            Ok(())
        }
    }

    struct CountingReceiver {
        calls: Arc<AtomicUsize>,
        fail_for: &'static str,
    }

    #[async_trait]
    impl Receiver for CountingReceiver {
        async fn receive(&self, agent_id: &AgentId, request: RpcRequest) -> RpcResponse {
            if agent_id.as_str() == self.fail_for {
                return RpcResponse::err(
                    agent_primitives::RpcError::new(agent_primitives::RpcErrorCode::InternalError, "boom"),
                    request.id,
                );
            }
            self.calls.fetch_add(1, Ordering::SeqCst);
            RpcResponse::ok(Value::Null, request.id)
        }
    }

    fn id(s: &str) -> AgentId {
        AgentId::new(s).unwrap()
    }

    #[tokio::test]
    async fn trigger_fans_out_to_all_subscribers_isolating_failures() {
        let calls = Arc::new(AtomicUsize::new(0));
        let receiver = Arc::new(CountingReceiver {
            calls: Arc::clone(&calls),
            fail_for: "s1",
        });
        let host = Arc::new(Host::new(receiver, Arc::new(NullTransport)));
        let bus = EventBus::new(host);

        let publisher = id("publisher");
        bus.subscribe(&publisher, "agent:s1", "ping", "onPing").await;
        bus.subscribe(&publisher, "agent:s2", "ping", "onPing").await;

        bus.trigger(&publisher, "ping", json!({"m": "hey"})).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let calls = Arc::new(AtomicUsize::new(0));
        let receiver = Arc::new(CountingReceiver {
            calls: Arc::clone(&calls),
            fail_for: "",
        });
        let host = Arc::new(Host::new(receiver, Arc::new(NullTransport)));
        let bus = EventBus::new(host);

        let publisher = id("publisher");
        bus.subscribe(&publisher, "agent:s1", "ping", "onPing").await;
        bus.unsubscribe(&publisher, "agent:s1", "ping", "onPing").await;
        bus.trigger(&publisher, "ping", Value::Null).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
