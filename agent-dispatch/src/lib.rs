//! The JSON-RPC Dispatcher: a declarative operation table built from
//! `#[operation]`-annotated functions, plus the trait hosted agent types
//! implement to participate in it.
//!
//! [`Dispatcher::dispatch`] resolves a method name against an agent's
//! [`AnnotatedClass`], validates required parameters, consults an optional
//! [`agent_policy::Authorizor`], and invokes the bound operation.

#![warn(missing_docs, clippy::pedantic)]

// `#[operation]` expands to paths rooted at `::agent_dispatch::...`; this
// lets that resolve in our own tests, where the crate can't otherwise name
// itself.
extern crate self as agent_dispatch;

mod agent;
mod dispatcher;
mod registry;

pub use agent::Agent;
pub use dispatcher::Dispatcher;
pub use registry::{
    annotated_class, AnnotatedClass, OperationDescriptor, OperationFuture, OperationInvoker,
    OperationRegistration, ParamDescriptor,
};

use agent_primitives::RpcError;

/// The return type every `#[operation]`-decorated function must use.
pub type OperationResult<T> = Result<T, RpcError>;

pub use inventory;
