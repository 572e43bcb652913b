//! The [`Agent`] trait every hosted agent type implements.

use std::any::Any;

/// A hosted agent type, exposing the downcast hook the Dispatcher uses to
/// reach the concrete type an operation was declared against.
///
/// Implementors are ordinary structs; `#[derive(Agent)]`-style codegen is
/// deliberately avoided in favor of the one-line `as_any`/`type_name` pair
/// below, kept consistent with how the runtime's other traits are
/// hand-implemented rather than derived.
pub trait Agent: Send + Sync {
    /// Returns the same value as `core::any::type_name::<Self>()`, used to
    /// key the reflection cache.
    fn type_name(&self) -> &'static str;

    /// Returns `self` as `&dyn Any` so the Dispatcher can downcast to the
    /// concrete type an operation descriptor was registered against.
    fn as_any(&self) -> &dyn Any;
}

/// Implements [`Agent`] for a concrete type in terms of `type_name`/`as_any`.
#[macro_export]
macro_rules! impl_agent {
    ($ty:ty) => {
        impl $crate::Agent for $ty {
            fn type_name(&self) -> &'static str {
                ::core::any::type_name::<$ty>()
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    };
}
