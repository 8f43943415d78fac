use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Edge, EdgeKind, EdgeTarget, EntityId, TargetType, User, Video};
use crate::error::ServiceResult;
use crate::repository::{bounded, EdgeStore, UserDirectory, VideoCatalog};

/// Which end of an edge to join against the entity collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinSide {
    Actor,
    Target,
}

impl JoinSide {
    fn id_of(&self, edge: &Edge) -> EntityId {
        match self {
            JoinSide::Actor => edge.actor_id,
            JoinSide::Target => edge.target.id,
        }
    }
}

/// Join `edges` against `entities`, one row per edge whose joined entity exists.
///
/// Edges whose entity is missing are skipped, not emitted as partial rows. Output order
/// is the input order.
pub fn project<'a, E, R, F>(
    edges: &'a [Edge],
    side: JoinSide,
    entities: &'a HashMap<EntityId, E>,
    shape: F,
) -> impl Iterator<Item = R> + 'a
where
    F: Fn(&'a Edge, &'a E) -> R + 'a,
{
    edges
        .iter()
        .filter_map(move |edge| {
            entities
                .get(&side.id_of(edge))
                .map(|entity| shape(edge, entity))
        })
}

fn join_ids(edges: &[Edge], side: JoinSide) -> Vec<EntityId> {
    let mut seen = HashSet::with_capacity(edges.len());
    edges
        .iter()
        .map(|edge| side.id_of(edge))
        .filter(|id| seen.insert(*id))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRow {
    pub subscriber_id: EntityId,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribedChannelRow {
    pub channel_id: EntityId,
    pub username: String,
    pub email: String,
    pub avatar: Option<String>,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedVideoRow {
    #[serde(flatten)]
    pub video: Video,
    pub liked_at: DateTime<Utc>,
}

/// Denormalized views over edges: channel subscribers, subscribed channels, liked videos.
#[derive(Clone)]
pub struct RelationshipProjector {
    edges: Arc<dyn EdgeStore>,
    users: Arc<dyn UserDirectory>,
    videos: Arc<dyn VideoCatalog>,
}

impl RelationshipProjector {
    pub fn new(
        edges: Arc<dyn EdgeStore>,
        users: Arc<dyn UserDirectory>,
        videos: Arc<dyn VideoCatalog>,
    ) -> Self {
        Self {
            edges,
            users,
            videos,
        }
    }

    pub async fn channel_subscribers(
        &self,
        channel_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Vec<SubscriberRow>> {
        let edges = bounded(
            timeout,
            "edges.list_by_target",
            self.edges.list_by_target(EdgeTarget::channel(channel_id)),
        )
        .await?;
        let users = self.users_for(&edges, JoinSide::Actor, timeout).await?;

        Ok(project(&edges, JoinSide::Actor, &users, |edge, user| SubscriberRow {
            subscriber_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            subscribed_at: edge.created_at,
        })
        .collect())
    }

    pub async fn subscribed_channels(
        &self,
        subscriber_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Vec<SubscribedChannelRow>> {
        let edges = bounded(
            timeout,
            "edges.list_by_actor",
            self.edges.list_by_actor(subscriber_id, EdgeKind::Subscription, None),
        )
        .await?;
        let users = self.users_for(&edges, JoinSide::Target, timeout).await?;

        Ok(project(&edges, JoinSide::Target, &users, |edge, channel| {
            SubscribedChannelRow {
                channel_id: channel.id,
                username: channel.username.clone(),
                email: channel.email.clone(),
                avatar: channel.avatar.clone(),
                subscribed_at: edge.created_at,
            }
        })
        .collect())
    }

    pub async fn liked_videos(
        &self,
        actor_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Vec<LikedVideoRow>> {
        let edges = bounded(
            timeout,
            "edges.list_by_actor",
            self.edges.list_by_actor(actor_id, EdgeKind::Like, Some(TargetType::Video)),
        )
        .await?;
        let ids = join_ids(&edges, JoinSide::Target);
        let videos = bounded(timeout, "videos.fetch", self.videos.fetch_videos(&ids)).await?;

        Ok(project(&edges, JoinSide::Target, &videos, |edge, video| LikedVideoRow {
            video: video.clone(),
            liked_at: edge.created_at,
        })
        .collect())
    }

    async fn users_for(
        &self,
        edges: &[Edge],
        side: JoinSide,
        timeout: Duration,
    ) -> ServiceResult<HashMap<EntityId, User>> {
        let ids = join_ids(edges, side);
        bounded(timeout, "users.fetch", self.users.fetch_users(&ids)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EdgeKey;
    use chrono::Duration as ChronoDuration;

    fn edge(actor: EntityId, target: EdgeTarget, age_minutes: i64) -> Edge {
        Edge::new(
            EdgeKey::new(actor, target),
            Utc::now() - ChronoDuration::minutes(age_minutes),
        )
    }

    #[test]
    fn drops_edges_with_missing_entities_and_keeps_order() {
        let channel = EntityId::new();
        let (a, b, c) = (EntityId::new(), EntityId::new(), EntityId::new());
        let edges = vec![
            edge(a, EdgeTarget::channel(channel), 1),
            edge(b, EdgeTarget::channel(channel), 2),
            edge(c, EdgeTarget::channel(channel), 3),
        ];
        let entities: HashMap<EntityId, &str> =
            [(a, "alice"), (c, "carol")].into_iter().collect();

        let rows: Vec<_> =
            project(&edges, JoinSide::Actor, &entities, |_, name| name.to_string()).collect();

        assert_eq!(rows, ["alice", "carol"]);
    }

    #[test]
    fn join_ids_are_unique_in_first_seen_order() {
        let actor = EntityId::new();
        let (v1, v2) = (EntityId::new(), EntityId::new());
        let edges = vec![
            edge(actor, EdgeTarget::video(v1), 1),
            edge(EntityId::new(), EdgeTarget::video(v2), 2),
            edge(EntityId::new(), EdgeTarget::video(v1), 3),
        ];

        assert_eq!(join_ids(&edges, JoinSide::Target), vec![v1, v2]);
    }
}
