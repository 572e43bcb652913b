//! Lifecycle state machine for hosted agents.
//!
//! Mirrors the state machine in the data model: an agent starts out
//! `Registered` (a persisted entry with no live instance), cycles between
//! `Awake` and `Released` arbitrarily without losing data, and ends in the
//! terminal `Deregistered` state once its entry and state are torn down.

use agent_primitives::AgentId;
use thiserror::Error;
use tracing::debug;

/// States an agent's entry can occupy over its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    /// Entry is persisted; no live instance exists.
    Registered,
    /// A live instance exists and may handle dispatch.
    Awake,
    /// The live instance was discarded; persisted data is intact.
    Released,
    /// The entry and its backing state have been torn down.
    Deregistered,
}

impl AgentState {
    /// Returns `true` when a live instance exists.
    #[must_use]
    pub const fn is_awake(self) -> bool {
        matches!(self, Self::Awake)
    }

    /// Returns `true` once the agent has been deregistered.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Deregistered)
    }
}

/// Events that trigger lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// `init` produced a live instance.
    Wake,
    /// The live instance was discarded, keeping persisted data.
    Release,
    /// The entry and its state were torn down.
    Deregister,
}

/// Lifecycle state manager for a single agent entry.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    agent_id: AgentId,
    state: AgentState,
}

impl Lifecycle {
    /// Constructs a lifecycle tracker for a freshly registered agent.
    #[must_use]
    pub fn new(agent_id: AgentId) -> Self {
        Self {
            agent_id,
            state: AgentState::Registered,
        }
    }

    /// Returns the owning agent identifier.
    #[must_use]
    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Applies a lifecycle event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] when the supplied event is
    /// not allowed from the current state.
    pub fn transition(&mut self, event: LifecycleEvent) -> LifecycleResult<AgentState> {
        let next = match (self.state, event) {
            (AgentState::Registered | AgentState::Released, LifecycleEvent::Wake) => {
                Some(AgentState::Awake)
            }
            (AgentState::Awake, LifecycleEvent::Release) => Some(AgentState::Released),
            (
                AgentState::Registered | AgentState::Released | AgentState::Awake,
                LifecycleEvent::Deregister,
            ) => Some(AgentState::Deregistered),
            _ => None,
        };

        let Some(next_state) = next else {
            return Err(LifecycleError::InvalidTransition {
                agent_id: self.agent_id.clone(),
                from: self.state,
                event,
            });
        };

        if next_state != self.state {
            debug!(
                agent_id = %self.agent_id,
                ?self.state,
                ?next_state,
                ?event,
                "agent lifecycle transition"
            );
            self.state = next_state;
        }

        Ok(self.state)
    }
}

/// Errors emitted by the lifecycle controller.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Transition was not permitted from the current state.
    #[error("invalid lifecycle transition from {from:?} via {event:?} for agent {agent_id}")]
    InvalidTransition {
        /// Identifier of the agent whose transition failed.
        agent_id: AgentId,
        /// State prior to the attempted transition.
        from: AgentState,
        /// Event that triggered the failure.
        event: LifecycleEvent,
    },
}

/// Result alias used for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
