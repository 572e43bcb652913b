//! The declarative operation table: per-agent-type reflection metadata built
//! once from `#[operation]`-registered descriptors and cached thereafter.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, RwLock};

use serde_json::{Map, Value};

use agent_primitives::RpcError;

use crate::agent::Agent;

/// Future returned by an operation invoker.
pub type OperationFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, RpcError>> + Send + 'a>>;

/// Function pointer generated by `#[operation]` that downcasts the agent,
/// binds parameters by name, calls the real implementation, and encodes the
/// result.
pub type OperationInvoker = for<'a> fn(&'a dyn Agent, Map<String, Value>) -> OperationFuture<'a>;

/// A single declared parameter: its name tag and whether it is required.
///
/// Only parameters carrying a name tag are dispatchable (§4.2); the
/// `#[operation]` macro only ever emits named parameters, so every
/// descriptor this table holds already satisfies that invariant.
#[derive(Debug, Clone, Copy)]
pub struct ParamDescriptor {
    name: &'static str,
    required: bool,
}

impl ParamDescriptor {
    /// Creates a parameter descriptor.
    #[must_use]
    pub const fn new(name: &'static str, required: bool) -> Self {
        Self { name, required }
    }

    /// Returns the parameter's name tag.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns whether the parameter is required.
    #[must_use]
    pub const fn required(&self) -> bool {
        self.required
    }
}

/// Memoized metadata for a single operation exposed over RPC.
#[derive(Clone)]
pub struct OperationDescriptor {
    name: &'static str,
    params: Vec<ParamDescriptor>,
    invoke: OperationInvoker,
}

impl OperationDescriptor {
    /// Creates a descriptor for the operation named `name`.
    #[must_use]
    pub fn new(name: &'static str, params: Vec<ParamDescriptor>, invoke: OperationInvoker) -> Self {
        Self { name, params, invoke }
    }

    /// Returns the operation name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the declared parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Invokes the operation against `agent` with the supplied params.
    pub async fn invoke(&self, agent: &dyn Agent, params: Map<String, Value>) -> Result<Value, RpcError> {
        (self.invoke)(agent, params).await
    }
}

/// Registration submitted by `#[operation]` via `inventory::submit!`. Holds a
/// function pointer rather than a built [`OperationDescriptor`] because the
/// latter owns a `Vec` and cannot be constructed in a `static` initializer.
pub struct OperationRegistration {
    type_name: &'static str,
    descriptor_fn: fn() -> OperationDescriptor,
}

impl OperationRegistration {
    /// Creates a registration entry for `type_name`.
    #[must_use]
    pub const fn new(type_name: &'static str, descriptor_fn: fn() -> OperationDescriptor) -> Self {
        Self {
            type_name,
            descriptor_fn,
        }
    }
}

inventory::collect!(OperationRegistration);

/// Reflection metadata for a single agent class: the set of exposed
/// operations, keyed by name. Operations sharing a name collapse to one
/// entry, the last one registered winning, mirroring "duplicates collapse
/// to one entry" for the single-struct case Rust's lack of inheritance
/// reduces the hierarchy rule to.
pub struct AnnotatedClass {
    type_name: &'static str,
    operations: HashMap<&'static str, OperationDescriptor>,
}

impl AnnotatedClass {
    /// Returns the agent type name this metadata describes.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Looks up an operation by name.
    #[must_use]
    pub fn operation(&self, name: &str) -> Option<&OperationDescriptor> {
        self.operations.get(name)
    }
}

static CACHE: OnceLock<RwLock<HashMap<&'static str, Arc<AnnotatedClass>>>> = OnceLock::new();

/// Returns the memoized [`AnnotatedClass`] for `type_name`, building it from
/// every `#[operation]` registered against that type on first access.
///
/// The cache is a process-wide mapping from class name to `AnnotatedClass`,
/// built on first access and immutable thereafter (§4.1): once inserted, an
/// entry is never mutated, only cloned out from behind the read lock.
#[must_use]
pub fn annotated_class(type_name: &'static str) -> Arc<AnnotatedClass> {
    let cache = CACHE.get_or_init(|| RwLock::new(HashMap::new()));

    if let Some(found) = cache.read().expect("reflection cache poisoned").get(type_name) {
        return Arc::clone(found);
    }

    let mut operations = HashMap::new();
    for registration in inventory::iter::<OperationRegistration> {
        if registration.type_name == type_name {
            let descriptor = (registration.descriptor_fn)();
            operations.insert(descriptor.name(), descriptor);
        }
    }

    let built = Arc::new(AnnotatedClass {
        type_name,
        operations,
    });

    let mut guard = cache.write().expect("reflection cache poisoned");
    Arc::clone(guard.entry(type_name).or_insert(built))
}
