//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for one inbound callback delivery.
///
/// Providers retry with identical bodies, so this identifies the delivery,
/// not the payment. It exists to correlate log lines of a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(Uuid);

impl CallbackId {
    /// Creates a new random CallbackId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a CallbackId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for CallbackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CallbackId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn callback_ids_are_unique() {
        assert_ne!(CallbackId::new(), CallbackId::new());
    }

    #[test]
    fn callback_id_parses_from_display() {
        let id = CallbackId::new();
        let parsed: CallbackId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn callback_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<CallbackId>().is_err());
    }
}
