//! Bounded worker pool used to fan out deferred background work without
//! spawning an unbounded number of threads.
//!
//! The Instantiation Service's Phase B boot uses this to wake the long tail
//! of non-priority entries: generalizing "thread per deferred boot" to a
//! fixed pool keeps a host with tens of thousands of entries from spawning
//! tens of thousands of OS threads at once.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Maximum number of concurrently in-flight tasks.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPoolConfig {
    max_concurrency: NonZeroUsize,
}

impl WorkerPoolConfig {
    /// Creates a new configuration with the supplied concurrency limit.
    #[must_use]
    pub const fn new(max_concurrency: NonZeroUsize) -> Self {
        Self { max_concurrency }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn max_concurrency(self) -> NonZeroUsize {
        self.max_concurrency
    }
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(32).expect("non-zero"))
    }
}

/// Lightweight wrapper around `tokio::spawn` that enforces a concurrency cap.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    closed: Arc<AtomicBool>,
    config: WorkerPoolConfig,
}

impl WorkerPool {
    /// Constructs a pool using the provided configuration.
    #[must_use]
    pub fn new(config: WorkerPoolConfig) -> Self {
        let permits = config.max_concurrency().get();
        Self {
            semaphore: Arc::new(Semaphore::new(permits)),
            closed: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    /// Returns the associated configuration.
    #[must_use]
    pub const fn config(&self) -> WorkerPoolConfig {
        self.config
    }

    /// Returns `true` if the pool has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Closes the pool, preventing new tasks from being spawned.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.semaphore.close();
    }

    /// Spawns a future, respecting the configured concurrency limit.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerPoolError::Closed`] when the pool is closed before the
    /// task is enqueued.
    ///
    /// # Panics
    ///
    /// Panics if the pool is closed while a task is awaiting a concurrency
    /// permit. This indicates that `close` was invoked concurrently with task
    /// submission.
    pub fn spawn<F, T>(&self, future: F) -> WorkerPoolResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(WorkerPoolError::Closed);
        }

        let semaphore = Arc::clone(&self.semaphore);

        let handle = tokio::spawn(async move {
            let permit = semaphore
                .acquire_owned()
                .await
                .expect("pool closed while awaiting permit");
            let output = future.await;
            drop(permit);
            output
        });

        Ok(handle)
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(WorkerPoolConfig::default())
    }
}

/// Errors produced by the worker pool.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkerPoolError {
    /// Pool is closed and will not accept new tasks.
    #[error("worker pool closed")]
    Closed,
}

/// Result alias for worker pool operations.
pub type WorkerPoolResult<T> = Result<T, WorkerPoolError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn respects_max_concurrency() {
        let config = WorkerPoolConfig::new(NonZeroUsize::new(2).unwrap());
        let pool = WorkerPool::new(config);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let pool = pool.clone();
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            handles.push(
                pool.spawn(async move {
                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(current, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap(),
            );
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn close_prevents_new_tasks() {
        let pool = WorkerPool::default();
        pool.close();

        let result = pool.spawn(async move {});
        assert_eq!(result.unwrap_err(), WorkerPoolError::Closed);
    }
}
