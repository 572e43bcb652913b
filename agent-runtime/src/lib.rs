//! Agent-hosting runtime SDK facade.
//!
//! Bundles the runtime's crates behind feature flags so a downstream binary
//! can depend on one thing and enable only the pieces it needs: the
//! lifecycle state machine and call correlation ([`kernel`]), the JSON-RPC
//! operation table ([`dispatch`]), lazy agent construction
//! ([`instantiation`]), publish/subscribe ([`events`]), keyed state
//! ([`state`]), authorization ([`policy`]), structured logging
//! ([`telemetry`]), declarative agent configuration ([`config`]), and the
//! HTTP call surface ([`transport`]).

#![warn(missing_docs, clippy::pedantic)]

/// Re-export shared primitives (ids, the RPC envelope, error codes).
pub use agent_primitives as primitives;

/// The Agent Host: lifecycle state machine, call/response correlation, the
/// delayed task scheduler (enabled by the `kernel` feature).
#[cfg(feature = "kernel")]
pub use agent_kernel as kernel;

/// The JSON-RPC Dispatcher and the `Agent` trait hosted agent types
/// implement (enabled by the `dispatch` feature).
#[cfg(feature = "dispatch")]
pub use agent_dispatch as dispatch;

/// The `#[operation]` attribute macro (enabled by the `dispatch` feature).
#[cfg(feature = "dispatch")]
pub use agent_dispatch_macros as dispatch_macros;

/// Lazy, keyed agent construction and two-phase boot (enabled by the
/// `instantiation` feature).
#[cfg(feature = "instantiation")]
pub use agent_instantiation as instantiation;

/// Publish/subscribe event fan-out (enabled by the `events` feature).
#[cfg(feature = "events")]
pub use agent_events as events;

/// Per-agent keyed state storage (enabled by the `state` feature).
#[cfg(feature = "state")]
pub use agent_state as state;

/// Authorization (enabled by the `policy` feature).
#[cfg(feature = "policy")]
pub use agent_policy as policy;

/// Structured logging setup (enabled by the `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use agent_telemetry as telemetry;

/// Declarative agent configuration loading (enabled by the `config`
/// feature).
#[cfg(feature = "config")]
pub use agent_config as config;

/// The HTTP call surface (enabled by the `transport` feature).
#[cfg(feature = "transport")]
pub use agent_transport as transport;
