//! Core shared types for the agent-hosting runtime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod rpc;

/// Error type and result alias shared across the runtime.
pub use error::{Error, Result};
/// Unique identifier for a hosted agent.
pub use ids::AgentId;
/// JSON-RPC envelope types and the wire error-code taxonomy.
pub use rpc::{RpcError, RpcErrorCode, RpcRequest, RpcResponse};
