//! Agent identifier types.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Unique identifier for an agent hosted by this runtime.
///
/// Unlike a generated UUID, agent ids are meaningful strings chosen by
/// configuration (`restagent`, `foo_groupAgent`, `notificationAgent_1`, ...);
/// the boot protocol inspects their textual shape, so the id is carried as a
/// plain `String` rather than an opaque binary identifier.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Creates an identifier from any owned or borrowed string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAgentId`] if the id is empty or contains a
    /// brace character, both of which the boot protocol treats as suspicious.
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        if id.is_empty() || id.contains('{') || id.contains('}') {
            return Err(Error::InvalidAgentId { id });
        }
        Ok(Self(id))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the id ends with the `_groupAgent` suffix used by the boot
    /// protocol's priority set.
    #[must_use]
    pub fn is_group_agent(&self) -> bool {
        self.0.ends_with("_groupAgent")
    }

    /// Returns the id with the `_groupAgent` suffix stripped, if present.
    #[must_use]
    pub fn strip_group_suffix(&self) -> Option<&str> {
        self.0.strip_suffix("_groupAgent")
    }

    /// True if the id starts with any of `notificationAgent_` or
    /// `messageAgent_`, the prefixes deferred to round 2 of boot.
    #[must_use]
    pub fn is_round_two(&self) -> bool {
        self.0.starts_with("notificationAgent_") || self.0.starts_with("messageAgent_")
    }
}

impl Display for AgentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for AgentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<AgentId> for String {
    fn from(value: AgentId) -> Self {
        value.0
    }
}

impl TryFrom<String> for AgentId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl FromStr for AgentId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
