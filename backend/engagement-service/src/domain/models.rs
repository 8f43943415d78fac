use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::EntityId;
use crate::error::ServiceError;

/// Kind of entity an edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    Video,
    Comment,
    Post,
    Channel,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Video => "Video",
            TargetType::Comment => "Comment",
            TargetType::Post => "Post",
            TargetType::Channel => "Channel",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Video" => Ok(TargetType::Video),
            "Comment" => Ok(TargetType::Comment),
            "Post" => Ok(TargetType::Post),
            "Channel" => Ok(TargetType::Channel),
            other => Err(ServiceError::Validation(format!(
                "unsupported target type: {}",
                other
            ))),
        }
    }
}

/// Relationship kinds. Each kind accepts a fixed set of target types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    Like,
    Subscription,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Like => "Like",
            EdgeKind::Subscription => "Subscription",
        }
    }

    pub fn accepts(&self, target: TargetType) -> bool {
        match self {
            EdgeKind::Like => matches!(
                target,
                TargetType::Video | TargetType::Comment | TargetType::Post
            ),
            EdgeKind::Subscription => target == TargetType::Channel,
        }
    }

    /// Every target type belongs to exactly one edge kind.
    pub fn of(target: TargetType) -> Self {
        match target {
            TargetType::Channel => EdgeKind::Subscription,
            _ => EdgeKind::Like,
        }
    }
}

/// Tagged edge target. Exactly one target per edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeTarget {
    #[serde(rename = "targetType")]
    pub kind: TargetType,
    #[serde(rename = "targetId")]
    pub id: EntityId,
}

impl EdgeTarget {
    pub fn new(kind: TargetType, id: EntityId) -> Self {
        Self { kind, id }
    }

    pub fn video(id: EntityId) -> Self {
        Self::new(TargetType::Video, id)
    }

    pub fn comment(id: EntityId) -> Self {
        Self::new(TargetType::Comment, id)
    }

    pub fn post(id: EntityId) -> Self {
        Self::new(TargetType::Post, id)
    }

    pub fn channel(id: EntityId) -> Self {
        Self::new(TargetType::Channel, id)
    }
}

/// Uniqueness key of an edge: at most one edge per (actor, target type, target id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub actor_id: EntityId,
    pub target: EdgeTarget,
}

impl EdgeKey {
    pub fn new(actor_id: EntityId, target: EdgeTarget) -> Self {
        Self { actor_id, target }
    }

    pub fn kind(&self) -> EdgeKind {
        EdgeKind::of(self.target.kind)
    }
}

/// A stored relationship edge (Like or Subscription).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EntityId,
    pub kind: EdgeKind,
    pub actor_id: EntityId,
    #[serde(flatten)]
    pub target: EdgeTarget,
    pub created_at: DateTime<Utc>,
}

impl Edge {
    pub fn new(key: EdgeKey, created_at: DateTime<Utc>) -> Self {
        Self {
            id: EntityId::new(),
            kind: key.kind(),
            actor_id: key.actor_id,
            target: key.target,
            created_at,
        }
    }
}

/// Channel/user profile fields needed by projections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: EntityId,
    pub owner: EntityId,
    pub title: String,
    pub description: String,
    pub video_file_url: String,
    pub thumbnail_url: String,
    /// Seconds
    pub duration: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: EntityId,
    pub video_id: EntityId,
    pub owner_id: EntityId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: EntityId,
    pub owner_id: EntityId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Owner-curated ordered list of videos.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: EntityId,
    pub owner_id: EntityId,
    pub name: String,
    pub description: String,
    /// Insertion order; the same video may appear more than once
    pub video_ids: Vec<EntityId>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_kinds_accept_only_their_targets() {
        assert!(EdgeKind::Like.accepts(TargetType::Video));
        assert!(EdgeKind::Like.accepts(TargetType::Comment));
        assert!(EdgeKind::Like.accepts(TargetType::Post));
        assert!(!EdgeKind::Like.accepts(TargetType::Channel));
        assert!(EdgeKind::Subscription.accepts(TargetType::Channel));
        assert!(!EdgeKind::Subscription.accepts(TargetType::Video));
    }

    #[test]
    fn edge_serializes_flat_target() {
        let actor = EntityId::new();
        let video = EntityId::new();
        let edge = Edge::new(EdgeKey::new(actor, EdgeTarget::video(video)), Utc::now());

        let json = serde_json::to_value(&edge).unwrap();
        assert_eq!(json["actorId"], actor.to_string());
        assert_eq!(json["targetType"], "Video");
        assert_eq!(json["targetId"], video.to_string());
        assert_eq!(json["kind"], "Like");
        assert!(json.get("target").is_none());
    }

    #[test]
    fn target_type_round_trips_through_storage_text() {
        for kind in [
            TargetType::Video,
            TargetType::Comment,
            TargetType::Post,
            TargetType::Channel,
        ] {
            assert_eq!(kind.as_str().parse::<TargetType>().unwrap(), kind);
        }
        assert!("video".parse::<TargetType>().is_err());
    }
}
