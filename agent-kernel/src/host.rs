//! The Agent Host (§4.3): routes inbound requests to agents and correlates
//! outbound `send`/`sendAsync` calls with their eventual responses.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_primitives::{AgentId, RpcError, RpcErrorCode, RpcRequest, RpcResponse};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, oneshot};
use tracing::warn;
use uuid::Uuid;

pub use crate::scheduler::Receiver;

/// Outbound carrier used for targets not hosted locally by this process.
/// The core only depends on this interface; concrete wire carriers (HTTP,
/// or any other transport) are external collaborators.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hands `request`, tagged with `tag`, to whatever peer `target_url`
    /// names. The transport is responsible for eventually calling
    /// [`Host::fulfill`] with the same tag once a response arrives.
    async fn dispatch(&self, target_url: &str, request: RpcRequest, tag: String) -> Result<(), TransportError>;
}

/// Error surfaced by a [`Transport`] implementation.
#[derive(Debug, Error)]
#[error("transport failure: {reason}")]
pub struct TransportError {
    /// Human-readable explanation for logging.
    pub reason: String,
}

/// Errors produced by [`Host::send`]/[`Host::send_async`].
#[derive(Debug, Error)]
pub enum HostError {
    /// The deadline elapsed before a response arrived.
    #[error("call to {target} timed out")]
    Timeout {
        /// The target url that did not respond in time.
        target: String,
    },
    /// The remote peer (or local agent) returned an RPC-level error.
    #[error("remote error: {0}")]
    Remote(#[from] RpcError),
    /// The configured transport failed to deliver the request.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The pending call was dropped without a response (e.g. the fulfilling
    /// side was torn down).
    #[error("call to {target} was dropped without a response")]
    Dropped {
        /// The target url whose pending call was dropped.
        target: String,
    },
}

/// Result alias for Host operations.
pub type HostResult<T> = Result<T, HostError>;

/// Tag→pending-callback map (§3 `PendingCall`, §4.3).
#[derive(Default)]
struct CallbackRegistry {
    pending: Mutex<HashMap<String, oneshot::Sender<RpcResponse>>>,
}

impl CallbackRegistry {
    fn new() -> Self {
        Self::default()
    }

    async fn install(&self, tag: String) -> oneshot::Receiver<RpcResponse> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(tag, tx);
        rx
    }

    /// Fulfills the pending call for `tag`, if one is installed. A response
    /// whose tag has no entry (unknown, already fulfilled, or canceled) is
    /// silently dropped, matching the out-of-band late reply contract.
    async fn fulfill(&self, tag: &str, response: RpcResponse) {
        if let Some(tx) = self.pending.lock().await.remove(tag) {
            // The receiver may already be gone (timeout/cancel raced the
            // reply); that is itself a no-op, not an error.
            let _ = tx.send(response);
        }
    }

    async fn cancel(&self, tag: &str) {
        self.pending.lock().await.remove(tag);
    }
}

/// The process-wide coordinator owning the tag→callback map and routing
/// `receive`/`send` between the Dispatcher and whatever transport a call
/// crosses.
pub struct Host {
    callbacks: CallbackRegistry,
    router: Arc<dyn Receiver>,
    transport: Arc<dyn Transport>,
}

impl Host {
    /// Builds a Host that dispatches local work to `router` and reaches
    /// non-local targets through `transport`.
    #[must_use]
    pub fn new(router: Arc<dyn Receiver>, transport: Arc<dyn Transport>) -> Self {
        Self {
            callbacks: CallbackRegistry::new(),
            router,
            transport,
        }
    }

    /// Delivers `request` to `agent_id`, returning its response. This is the
    /// single entry point transports call on every inbound message,
    /// including self-addressed sends the Host short-circuits locally.
    pub async fn receive(&self, agent_id: &AgentId, request: RpcRequest) -> RpcResponse {
        self.router.receive(agent_id, request).await
    }

    /// Delivers a response that arrived out-of-band (from a transport) for
    /// an outstanding `send`/`send_async` call.
    pub async fn fulfill(&self, tag: &str, response: RpcResponse) {
        self.callbacks.fulfill(tag, response).await;
    }

    /// Synchronous outbound call. If `target` names a locally hosted agent
    /// the Host short-circuits directly to [`Host::receive`]; otherwise the
    /// call crosses the configured [`Transport`].
    pub async fn send(
        &self,
        target: &str,
        method: &str,
        params: serde_json::Value,
        deadline: Option<Duration>,
    ) -> HostResult<serde_json::Value> {
        let pending = self.send_async(target, method, params).await?;
        pending.await_response(deadline).await
    }

    /// Same as [`Host::send`], but returns a handle immediately instead of
    /// blocking the caller.
    pub async fn send_async(
        &self,
        target: &str,
        method: &str,
        params: serde_json::Value,
    ) -> HostResult<PendingCallHandle<'_>> {
        let request = RpcRequest::new(method, params);

        if let Some(agent_id) = local_agent_id(target) {
            let response = self.receive(&agent_id, request).await;
            return Ok(PendingCallHandle::Ready(response, target.to_owned()));
        }

        let tag = Uuid::new_v4().simple().to_string();
        let rx = self.callbacks.install(tag.clone()).await;
        self.transport
            .dispatch(target, request, tag.clone())
            .await?;

        Ok(PendingCallHandle::Pending {
            host: self,
            tag,
            target: target.to_owned(),
            rx,
        })
    }
}

/// Strips a local agent-addressing scheme (`agent:` or `agent://`), returning
/// the bare id. Because this runtime does not implement cross-process
/// federation, every target currently resolves locally; a multi-host
/// deployment would replace this with a real routing table.
fn local_agent_id(target: &str) -> Option<AgentId> {
    let stripped = target
        .strip_prefix("agent://")
        .or_else(|| target.strip_prefix("agent:"))
        .unwrap_or(target);
    AgentId::new(stripped).ok()
}

/// A handle to an in-flight `send`, either already resolved (self-call
/// short-circuit) or awaiting a transport-delivered response.
pub enum PendingCallHandle<'a> {
    /// Resolved synchronously because the target was local.
    Ready(RpcResponse, String),
    /// Awaiting a response for `tag` via the configured transport.
    Pending {
        /// Back-reference used to cancel on timeout.
        host: &'a Host,
        /// Correlation tag installed in the callback registry.
        tag: String,
        /// The original target, for error messages.
        target: String,
        /// Receiver side of the oneshot fulfilled by [`Host::fulfill`].
        rx: oneshot::Receiver<RpcResponse>,
    },
}

impl PendingCallHandle<'_> {
    /// Awaits the response, honoring an optional deadline, and coerces it
    /// into a result or the carried RPC error.
    pub async fn await_response(self, deadline: Option<Duration>) -> HostResult<serde_json::Value> {
        let (response, target) = match self {
            Self::Ready(response, target) => (response, target),
            Self::Pending { host, tag, target, rx } => {
                let response = match deadline {
                    Some(timeout) => match tokio::time::timeout(timeout, rx).await {
                        Ok(Ok(response)) => response,
                        Ok(Err(_)) => return Err(HostError::Dropped { target }),
                        Err(_) => {
                            host.callbacks.cancel(&tag).await;
                            return Err(HostError::Timeout { target });
                        }
                    },
                    None => rx.await.map_err(|_| HostError::Dropped {
                        target: target.clone(),
                    })?,
                };
                (response, target)
            }
        };

        match response.error {
            Some(error) => {
                if error.code == RpcErrorCode::Timeout.as_i64() {
                    warn!(%target, "remote reported a timeout");
                }
                Err(HostError::Remote(error))
            }
            None => Ok(response.result.unwrap_or(serde_json::Value::Null)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoRouter;

    #[async_trait]
    impl Receiver for EchoRouter {
        async fn receive(&self, _agent_id: &AgentId, request: RpcRequest) -> RpcResponse {
            RpcResponse::ok(request.params, None)
        }
    }

    struct NullTransport;

    #[async_trait]
    impl Transport for NullTransport {
        async fn dispatch(&self, target_url: &str, _request: RpcRequest, _tag: String) -> Result<(), TransportError> {
            Err(TransportError {
                reason: format!("no route to {target_url}"),
            })
        }
    }

    #[tokio::test]
    async fn self_addressed_send_short_circuits_locally() {
        let host = Host::new(Arc::new(EchoRouter), Arc::new(NullTransport));
        let result = host
            .send("agent:restagent", "ping", json!({"message": "hi"}), None)
            .await
            .unwrap();
        assert_eq!(result, json!({"message": "hi"}));
    }

    #[tokio::test]
    async fn remote_response_fulfills_pending_call() {
        struct RecordingTransport {
            host_callbacks: Arc<Mutex<Option<(String, RpcResponse)>>>,
        }

        #[async_trait]
        impl Transport for RecordingTransport {
            async fn dispatch(&self, _target_url: &str, request: RpcRequest, tag: String) -> Result<(), TransportError> {
                *self.host_callbacks.lock().await = Some((
                    tag,
                    RpcResponse::ok(request.params, None),
                ));
                Ok(())
            }
        }

        let slot: Arc<Mutex<Option<(String, RpcResponse)>>> = Arc::new(Mutex::new(None));
        let transport = Arc::new(RecordingTransport {
            host_callbacks: Arc::clone(&slot),
        });
        let host = Arc::new(Host::new(Arc::new(EchoRouter), transport));

        let pending = host
            .send_async("http://peer/agents/bar", "echo", json!({"v": 1}))
            .await
            .unwrap();

        let (tag, response) = slot.lock().await.take().expect("transport captured a tag");
        host.fulfill(&tag, response).await;

        let result = pending.await_response(None).await.unwrap();
        assert_eq!(result, json!({"v": 1}));
    }

    #[tokio::test]
    async fn timeout_removes_pending_entry() {
        struct BlackHoleTransport;

        #[async_trait]
        impl Transport for BlackHoleTransport {
            async fn dispatch(&self, _target_url: &str, _request: RpcRequest, _tag: String) -> Result<(), TransportError> {
                Ok(())
            }
        }

        let host = Host::new(Arc::new(EchoRouter), Arc::new(BlackHoleTransport));
        let err = host
            .send(
                "http://peer/agents/bar",
                "echo",
                json!({}),
                Some(Duration::from_millis(20)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, HostError::Timeout { .. }));
    }

    #[tokio::test]
    async fn unknown_tag_response_is_silently_dropped() {
        let host = Host::new(Arc::new(EchoRouter), Arc::new(NullTransport));
        // No pending call was ever installed under this tag.
        host.fulfill("no-such-tag", RpcResponse::ok(json!(null), None))
            .await;
    }
}
