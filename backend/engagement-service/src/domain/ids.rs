use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ServiceError;

/// Canonical identifier for every stored entity (users, videos, comments, posts, edges).
///
/// Parsing is the only validation gate: anything that is not a UUID is rejected
/// with a validation error before a storage round-trip happens.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parse a caller-supplied id, naming the offending field in the error.
    pub fn parse(field: &str, raw: &str) -> Result<Self, ServiceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ServiceError::Validation(format!("{} is required", field)));
        }
        Uuid::parse_str(trimmed)
            .map(Self)
            .map_err(|_| ServiceError::Validation(format!("{} is not a valid id", field)))
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<EntityId> for Uuid {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl FromStr for EntityId {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse("id", s)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_uuid() {
        let raw = "7f1c1c3e-2b1a-4e43-9a55-0d5a3c1b2e10";
        let id = EntityId::parse("videoId", raw).unwrap();
        assert_eq!(id.to_string(), raw);
    }

    #[test]
    fn rejects_blank_and_malformed_ids() {
        let blank = EntityId::parse("videoId", "   ").unwrap_err();
        assert!(matches!(blank, ServiceError::Validation(msg) if msg == "videoId is required"));

        let malformed = EntityId::parse("channelId", "c1").unwrap_err();
        assert!(matches!(malformed, ServiceError::Validation(msg) if msg.contains("channelId")));
    }
}
