//! The Agent Host and its supporting pieces: lifecycle state machine,
//! call/response correlation, and the per-agent delayed task scheduler.
//!
//! These building blocks are deliberately free of any dependency on
//! instantiation, dispatch, or transport so that those crates can depend on
//! this one without a cycle; this crate only knows about the
//! [`Receiver`] trait its callers implement.

#![warn(missing_docs, clippy::pedantic)]

mod host;
mod lifecycle;
mod scheduler;
mod worker_pool;

pub use host::{Host, HostError, HostResult, PendingCallHandle, Receiver, Transport, TransportError};
pub use lifecycle::{AgentState, Lifecycle, LifecycleError, LifecycleEvent, LifecycleResult};
pub use scheduler::{
    DelayedTaskScheduler, ScheduledTask, SchedulerPersistence, SchedulerPersistenceError,
};
pub use worker_pool::{WorkerPool, WorkerPoolConfig, WorkerPoolError, WorkerPoolResult};
