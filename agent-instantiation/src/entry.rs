//! The persistent entry record and its non-persistent handler slot.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use agent_dispatch::Agent;
use agent_primitives::AgentId;

/// A retargetable reference to an agent's live instance.
///
/// Callers hold this across release/re-init cycles (the "weak handler
/// indirection" design note): dereferencing never itself causes an `init`,
/// but the [`InstantiationService`](crate::InstantiationService) updates the
/// same handle in place when a stale instance is replaced, so existing
/// holders transparently observe the new one.
#[derive(Clone)]
pub struct AgentHandle(Arc<RwLock<Option<Arc<dyn Agent>>>>);

impl AgentHandle {
    fn empty() -> Self {
        Self(Arc::new(RwLock::new(None)))
    }

    /// Returns the current live instance, if any.
    pub async fn get(&self) -> Option<Arc<dyn Agent>> {
        self.0.read().await.clone()
    }

    /// Retargets the handle to a newly constructed instance.
    pub async fn set(&self, instance: Arc<dyn Agent>) {
        *self.0.write().await = Some(instance);
    }
}

/// In-memory entry: the persistent fields plus the non-persistent handler.
pub struct Entry {
    /// The agent id this entry is keyed under.
    pub key: AgentId,
    /// The resolvable class name.
    pub class_name: String,
    /// The JSON config handed to the constructor.
    pub params: Value,
    /// The live instance, once constructed.
    pub handler: AgentHandle,
    /// Serializes concurrent `init` calls for this key to one construction.
    pub(crate) construct_lock: Mutex<()>,
}

impl Entry {
    /// Builds a fresh entry with no live instance.
    #[must_use]
    pub fn new(key: AgentId, class_name: String, params: Value) -> Self {
        Self {
            key,
            class_name,
            params,
            handler: AgentHandle::empty(),
            construct_lock: Mutex::new(()),
        }
    }
}
