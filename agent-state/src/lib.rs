//! The State Service: the durable per-key JSON store the Instantiation
//! Service, Scheduler, and Event Bus all persist through, plus two
//! reference implementations.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod file;
mod memory;
mod service;

pub use error::{StateError, StateResult};
pub use file::FileStateService;
pub use memory::InMemoryStateService;
pub use service::StateService;
