//! The Instantiation Service (§4.1): entry table, two-phase boot, and the
//! lazy-construction algorithm backing `init`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use agent_dispatch::Agent;
use agent_kernel::{WorkerPool, WorkerPoolConfig};
use agent_primitives::AgentId;

use crate::entry::Entry;
use crate::factory::resolve_class;
use crate::persistence::{EntryRecord, InstantiationPersistence};

struct Inner {
    entries: Mutex<HashMap<AgentId, Arc<Entry>>>,
    persistence: Option<Arc<dyn InstantiationPersistence>>,
    boot_pool: WorkerPool,
}

/// Registers, persists, wakes, and releases agents by key.
///
/// Cheaply cloneable: cloning shares the same entry table, persistence
/// backend, and boot worker pool, so a handle can be moved into the
/// background tasks `boot()` spawns for Phase B.
#[derive(Clone)]
pub struct InstantiationService(Arc<Inner>);

impl InstantiationService {
    /// Creates a service with no persistence backend; entries live only in
    /// memory for the life of the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(None, WorkerPoolConfig::default())
    }

    /// Creates a service backed by `persistence`, with Phase B boot fan-out
    /// bounded by `boot_concurrency`.
    #[must_use]
    pub fn new(
        persistence: Option<Arc<dyn InstantiationPersistence>>,
        boot_concurrency: WorkerPoolConfig,
    ) -> Self {
        Self(Arc::new(Inner {
            entries: Mutex::new(HashMap::new()),
            persistence,
            boot_pool: WorkerPool::new(boot_concurrency),
        }))
    }

    /// Writes an entry for `key`, overwriting any existing entry. No live
    /// instance is created; a subsequent `init` constructs lazily.
    pub async fn register(&self, key: AgentId, class_name: impl Into<String>, params: Value) {
        let class_name = class_name.into();
        let record = EntryRecord {
            key: key.clone(),
            class_name: class_name.clone(),
            params: params.clone(),
        };

        if let Some(store) = &self.0.persistence
            && let Err(err) = store.save(&record).await
        {
            warn!(agent_id = %key, error = %err, "failed to persist instantiation entry");
        }

        let entry = Arc::new(Entry::new(key.clone(), class_name, params));
        self.0.entries.lock().await.insert(key, entry);
    }

    /// Removes the entry and its backing state for `key`. Idempotent.
    pub async fn deregister(&self, key: &AgentId) {
        self.0.entries.lock().await.remove(key);

        if let Some(store) = &self.0.persistence
            && let Err(err) = store.remove(key).await
        {
            warn!(agent_id = %key, error = %err, "failed to remove instantiation entry");
        }
    }

    /// True iff an entry record exists for `key`, awake or not.
    pub async fn exists(&self, key: &AgentId) -> bool {
        if self.0.entries.lock().await.contains_key(key) {
            return true;
        }

        match &self.0.persistence {
            Some(store) => matches!(store.load(key).await, Ok(Some(_))),
            None => false,
        }
    }

    /// Returns the live instance for `key`, constructing one if necessary.
    /// Returns `None` (with a logged warning) if no entry is registered, the
    /// class cannot be resolved, or construction fails; the entry itself is
    /// left intact for a later retry.
    pub async fn init(&self, key: &AgentId) -> Option<Arc<dyn Agent>> {
        let entry = self.entry_for(key).await?;

        if let Some(existing) = entry.handler.get().await {
            return Some(existing);
        }

        let _construct_guard = entry.construct_lock.lock().await;
        if let Some(existing) = entry.handler.get().await {
            return Some(existing);
        }

        let Some(factory) = resolve_class(&entry.class_name) else {
            warn!(agent_id = %key, class_name = %entry.class_name, "no factory registered for class");
            return None;
        };

        let instance = match factory.construct(entry.params.clone()) {
            Ok(instance) => instance,
            Err(err) => {
                warn!(agent_id = %key, class_name = %entry.class_name, error = %err, "failed to construct agent");
                return None;
            }
        };

        entry.handler.set(Arc::clone(&instance)).await;
        Some(instance)
    }

    /// Two-phase cold start: wakes the priority set synchronously, then
    /// wakes the remainder on the boot worker pool.
    pub async fn boot(&self) {
        let Some(store) = &self.0.persistence else {
            debug!("no persistence backend configured; boot is a no-op");
            return;
        };

        let records = match store.load_all().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "failed to load persisted entries for boot");
                return;
            }
        };

        let known: HashSet<AgentId> = records.iter().map(|record| record.key.clone()).collect();
        let mut priority: HashSet<AgentId> = HashSet::new();

        for record in &records {
            if record.key.is_group_agent()
                && let Some(stripped) = record.key.strip_group_suffix()
                && let Ok(stripped_id) = AgentId::new(stripped)
                && known.contains(&stripped_id)
            {
                priority.insert(record.key.clone());
                priority.insert(stripped_id);
            }
        }
        if let Ok(restagent) = AgentId::new("restagent")
            && known.contains(&restagent)
        {
            priority.insert(restagent);
        }

        info!(count = priority.len(), "boot phase A: waking priority set");
        let mut woken = 0usize;
        for id in &priority {
            match self.init(id).await {
                Some(_) => woken += 1,
                None => warn!(agent_id = %id, "phase A wake failed"),
            }
        }
        info!(woken, "boot phase A complete");

        let remaining: Vec<AgentId> = records
            .into_iter()
            .map(|record| record.key)
            .filter(|id| !priority.contains(id))
            .collect();
        let (round_two, round_one): (Vec<AgentId>, Vec<AgentId>) =
            remaining.into_iter().partition(AgentId::is_round_two);

        self.wake_round(round_one, 1).await;
        self.wake_round(round_two, 2).await;
    }

    /// Tears down the whole service: clears the entry table and, if
    /// configured, wipes the persistence backend.
    pub async fn delete(&self) {
        self.0.entries.lock().await.clear();

        if let Some(store) = &self.0.persistence
            && let Err(err) = store.clear_all().await
        {
            warn!(error = %err, "failed to clear persisted instantiation entries");
        }
    }

    async fn entry_for(&self, key: &AgentId) -> Option<Arc<Entry>> {
        {
            let guard = self.0.entries.lock().await;
            if let Some(entry) = guard.get(key) {
                return Some(Arc::clone(entry));
            }
        }

        let record = match &self.0.persistence {
            Some(store) => match store.load(key).await {
                Ok(Some(record)) => record,
                Ok(None) => return None,
                Err(err) => {
                    warn!(agent_id = %key, error = %err, "failed to load instantiation entry");
                    return None;
                }
            },
            None => return None,
        };

        let entry = Arc::new(Entry::new(record.key, record.class_name, record.params));
        let mut guard = self.0.entries.lock().await;
        Some(Arc::clone(guard.entry(key.clone()).or_insert(entry)))
    }

    /// Wakes `ids` on the boot pool and awaits every wake before returning,
    /// logging progress every 100 agents.
    async fn wake_round(&self, ids: Vec<AgentId>, round: u8) {
        if ids.is_empty() {
            return;
        }

        let woken = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut handles = Vec::with_capacity(ids.len());

        for id in ids {
            // `AgentId` deserializes transparently from its persisted string,
            // so a corrupt record can still carry a suspicious id (empty, or
            // containing a brace) that its constructor would normally reject.
            if id.as_str().is_empty() || id.as_str().contains('{') || id.as_str().contains('}') {
                warn!(agent_id = %id, "skipping suspicious agent id during boot");
                continue;
            }

            let service = self.clone();
            let woken = Arc::clone(&woken);
            let Ok(handle) = self.0.boot_pool.spawn(async move {
                if service.init(&id).await.is_none() {
                    warn!(agent_id = %id, round, "failed to wake agent during boot");
                }
                let count = woken.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
                if count % 100 == 0 {
                    info!(round, count, "boot progress");
                }
            }) else {
                continue;
            };
            handles.push(handle);
        }

        for handle in handles {
            let _ = handle.await;
        }

        info!(round, woken = woken.load(std::sync::atomic::Ordering::SeqCst), "boot round complete");
    }
}
