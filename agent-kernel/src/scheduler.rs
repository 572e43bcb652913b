//! Per-agent delayed task scheduler (§4.4): `createTask`/`cancelTask`, firing
//! a synthesized self-RPC once the due time elapses.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use agent_primitives::{AgentId, RpcRequest};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Receives a synthesized request on behalf of the scheduler, the event bus,
/// and any other internal caller that needs to hand a request to an agent
/// without going through a transport. The Host implements this.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Delivers `request` to `agent_id` and returns its response.
    async fn receive(&self, agent_id: &AgentId, request: RpcRequest) -> agent_primitives::RpcResponse;
}

/// Persists scheduled tasks so a restart can re-arm future tasks and
/// immediately fire past-due ones. Optional: a scheduler with no persistence
/// configured simply loses its queue across a restart.
#[async_trait]
pub trait SchedulerPersistence: Send + Sync {
    /// Upserts a task record.
    async fn save(&self, agent_id: &AgentId, task: &ScheduledTask) -> Result<(), SchedulerPersistenceError>;
    /// Removes a task record by id.
    async fn remove(&self, agent_id: &AgentId, task_id: &str) -> Result<(), SchedulerPersistenceError>;
    /// Loads every task persisted for the given agent.
    async fn load(&self, agent_id: &AgentId) -> Result<Vec<ScheduledTask>, SchedulerPersistenceError>;
}

/// Error surfaced by a [`SchedulerPersistence`] backend.
#[derive(Debug, Error)]
#[error("scheduler persistence failure: {reason}")]
pub struct SchedulerPersistenceError {
    /// Human-readable explanation for logging.
    pub reason: String,
}

/// A scheduled task as persisted in the owning agent's state.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScheduledTask {
    /// Stable id returned from `createTask`.
    pub id: String,
    /// Unix-millis due time.
    pub due_unix_ms: i64,
    /// The request to synthesize once due.
    pub request: RpcRequest,
}

/// Key used to order the task queue: due time first, then insertion
/// sequence, so tasks scheduled in order T1, T2 with equal delay fire T1
/// before T2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct TaskKey {
    due_unix_ms: i64,
    seq: u64,
}

struct SchedulerState {
    queue: BTreeMap<TaskKey, ScheduledTask>,
    by_id: HashMap<String, TaskKey>,
    next_seq: u64,
    next_id: u64,
    closed: bool,
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            by_id: HashMap::new(),
            next_seq: 0,
            next_id: 0,
            closed: false,
        }
    }
}

/// Delayed, cancelable task queue for a single agent.
///
/// Spec requires "only one scheduler thread services a given agent at a
/// time"; this is realized as a single background task per
/// `DelayedTaskScheduler` that owns the firing loop.
pub struct DelayedTaskScheduler {
    agent_id: AgentId,
    state: Arc<Mutex<SchedulerState>>,
    notify: Arc<Notify>,
    persistence: Option<Arc<dyn SchedulerPersistence>>,
    worker: JoinHandle<()>,
}

impl DelayedTaskScheduler {
    /// Starts a scheduler for `agent_id`, firing synthesized requests
    /// through `receiver`. If `persistence` is supplied, any tasks it
    /// reports for this agent are re-armed immediately (past-due tasks fire
    /// right away, in undefined order relative to each other, matching the
    /// best-effort-after-restart contract).
    pub async fn start(
        agent_id: AgentId,
        receiver: Arc<dyn Receiver>,
        persistence: Option<Arc<dyn SchedulerPersistence>>,
    ) -> Self {
        let state = Arc::new(Mutex::new(SchedulerState::new()));
        let notify = Arc::new(Notify::new());

        if let Some(store) = &persistence {
            match store.load(&agent_id).await {
                Ok(tasks) => {
                    let mut guard = state.lock().await;
                    for task in tasks {
                        let key = TaskKey {
                            due_unix_ms: task.due_unix_ms,
                            seq: guard.next_seq,
                        };
                        guard.next_seq += 1;
                        guard.by_id.insert(task.id.clone(), key);
                        guard.queue.insert(key, task);
                    }
                }
                Err(err) => warn!(agent_id = %agent_id, error = %err, "failed to load persisted tasks"),
            }
        }

        let worker = tokio::spawn(run_firing_loop(
            agent_id.clone(),
            Arc::clone(&state),
            Arc::clone(&notify),
            receiver,
            persistence.clone(),
        ));

        Self {
            agent_id,
            state,
            notify,
            persistence,
            worker,
        }
    }

    /// Schedules `request` to fire after `delay`, returning its stable id.
    pub async fn create_task(&self, request: RpcRequest, delay: Duration) -> String {
        let due_unix_ms = now_unix_ms() + i64::try_from(delay.as_millis()).unwrap_or(i64::MAX);
        let mut guard = self.state.lock().await;
        let id = format!("task-{}", guard.next_id);
        guard.next_id += 1;
        let key = TaskKey {
            due_unix_ms,
            seq: guard.next_seq,
        };
        guard.next_seq += 1;
        let task = ScheduledTask {
            id: id.clone(),
            due_unix_ms,
            request,
        };
        guard.by_id.insert(id.clone(), key);
        guard.queue.insert(key, task.clone());
        drop(guard);

        if let Some(store) = &self.persistence
            && let Err(err) = store.save(&self.agent_id, &task).await
        {
            warn!(agent_id = %self.agent_id, task_id = %id, error = %err, "failed to persist scheduled task");
        }

        self.notify.notify_one();
        id
    }

    /// Cancels a task by id. Idempotent: canceling an unknown or
    /// already-fired id succeeds silently.
    pub async fn cancel_task(&self, task_id: &str) {
        let mut guard = self.state.lock().await;
        if let Some(key) = guard.by_id.remove(task_id) {
            guard.queue.remove(&key);
        }
        drop(guard);

        if let Some(store) = &self.persistence
            && let Err(err) = store.remove(&self.agent_id, task_id).await
        {
            warn!(agent_id = %self.agent_id, task_id, error = %err, "failed to remove persisted task");
        }

        self.notify.notify_one();
    }

    /// Stops the firing loop. Pending tasks remain persisted (if a
    /// persistence backend is configured) and will re-arm on the next
    /// `start`.
    pub fn shutdown(&self) {
        self.worker.abort();
    }
}

fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

async fn run_firing_loop(
    agent_id: AgentId,
    state: Arc<Mutex<SchedulerState>>,
    notify: Arc<Notify>,
    receiver: Arc<dyn Receiver>,
    persistence: Option<Arc<dyn SchedulerPersistence>>,
) {
    loop {
        let next_due = {
            let guard = state.lock().await;
            if guard.closed {
                return;
            }
            guard.queue.keys().next().copied()
        };

        match next_due {
            None => notify.notified().await,
            Some(key) => {
                let now = now_unix_ms();
                if key.due_unix_ms > now {
                    let wait = Duration::from_millis(u64::try_from(key.due_unix_ms - now).unwrap_or(0));
                    tokio::select! {
                        () = tokio::time::sleep(wait) => {}
                        () = notify.notified() => continue,
                    }
                }

                let due = {
                    let mut guard = state.lock().await;
                    let mut due = Vec::new();
                    let now = now_unix_ms();
                    let ready: Vec<TaskKey> = guard
                        .queue
                        .range(..=TaskKey { due_unix_ms: now, seq: u64::MAX })
                        .map(|(k, _)| *k)
                        .collect();
                    for key in ready {
                        if let Some(task) = guard.queue.remove(&key) {
                            guard.by_id.remove(&task.id);
                            due.push(task);
                        }
                    }
                    due
                };

                for task in due {
                    debug!(agent_id = %agent_id, task_id = %task.id, "firing scheduled task");
                    let _ = receiver.receive(&agent_id, task.request.clone()).await;
                    if let Some(store) = &persistence
                        && let Err(err) = store.remove(&agent_id, &task.id).await
                    {
                        warn!(agent_id = %agent_id, task_id = %task.id, error = %err, "failed to remove fired task");
                    }
                }
            }
        }
    }
}
