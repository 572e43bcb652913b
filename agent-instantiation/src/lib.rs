//! The Instantiation Service: registers, persists, wakes, and releases
//! agents by key, and the two-phase boot protocol that wakes a whole fleet
//! from a persisted entry table on process start.

#![warn(missing_docs, clippy::pedantic)]

mod entry;
mod factory;
mod persistence;
mod service;

pub use entry::AgentHandle;
pub use factory::{resolve_class, AgentConstructor, AgentFactory, FactoryError};
pub use persistence::{EntryRecord, InstantiationPersistence, InstantiationPersistenceError};
pub use service::InstantiationService;
