//! Identifier types for expression placeholders

use std::fmt;
use uuid::Uuid;

/// Parameter ID - identity of a free-variable placeholder
///
/// Two placeholders are the same variable only if their ids match; display
/// names carry no identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterId(Uuid);

impl ParameterId {
    /// Create a new random parameter ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParameterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ParameterId> for Uuid {
    fn from(id: ParameterId) -> Self {
        id.0
    }
}
