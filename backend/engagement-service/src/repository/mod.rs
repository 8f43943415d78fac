//! Storage seams. Services only see these traits; `postgres` and `memory` provide the
//! backends.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use crate::domain::{
    Comment, Edge, EdgeKey, EdgeKind, EdgeTarget, EntityId, FeedEntity, FeedQuery, Page,
    Playlist, TargetType, User, Video,
};
use crate::error::{ServiceError, ServiceResult};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Persistence of relationship edges with a uniqueness constraint per
/// (actor, target type, target id).
#[async_trait]
pub trait EdgeStore: Send + Sync {
    /// Insert an edge for `key`. Returns `None` when an edge for the key already
    /// exists (the uniqueness constraint rejected the insert).
    async fn insert(&self, key: EdgeKey) -> ServiceResult<Option<Edge>>;

    /// Delete the edge for `key`. Returns `None` when there was nothing to delete.
    async fn delete(&self, key: EdgeKey) -> ServiceResult<Option<Edge>>;

    async fn find(&self, key: EdgeKey) -> ServiceResult<Option<Edge>>;

    /// Edges pointing at `target`, newest first, ties by edge id ascending.
    async fn list_by_target(&self, target: EdgeTarget) -> ServiceResult<Vec<Edge>>;

    /// Edges of `kind` created by `actor_id`, newest first, ties by edge id ascending.
    /// `target_type` narrows likes to one target kind.
    async fn list_by_actor(
        &self,
        actor_id: EntityId,
        kind: EdgeKind,
        target_type: Option<TargetType>,
    ) -> ServiceResult<Vec<Edge>>;
}

/// Executes a feed query against one entity collection.
#[async_trait]
pub trait FeedSource<T: FeedEntity>: Send + Sync {
    async fn execute(&self, query: &FeedQuery) -> ServiceResult<Page<T>>;
}

/// Lookup of channel/user profiles.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Users that exist among `ids`; missing ids are simply absent from the map.
    async fn fetch_users(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, User>>;
}

#[async_trait]
pub trait VideoCatalog: Send + Sync {
    async fn get_video(&self, id: EntityId) -> ServiceResult<Option<Video>>;

    /// Videos that exist among `ids`; missing ids are simply absent from the map.
    async fn fetch_videos(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, Video>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> ServiceResult<Comment>;

    /// Returns the updated comment, or `None` if it does not exist.
    async fn update_content(
        &self,
        comment_id: EntityId,
        content: String,
    ) -> ServiceResult<Option<Comment>>;

    /// Returns whether a comment was removed.
    async fn delete_comment(&self, comment_id: EntityId) -> ServiceResult<bool>;
}

/// Ordered video lists. Each mutation is one atomic statement on the playlist row.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    /// Playlists owned by `owner_id`, newest first, ties by id ascending.
    async fn list_by_owner(&self, owner_id: EntityId) -> ServiceResult<Vec<Playlist>>;

    /// Append `video_id` to the end, keeping any earlier occurrence. `None` if the
    /// playlist does not exist.
    async fn append_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>>;

    /// Remove every occurrence of `video_id`. `None` if the playlist does not exist.
    async fn remove_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>>;
}

/// Bound one storage round-trip by `limit`.
///
/// Every write the backends issue is a single atomic statement, so an elapsed timer
/// leaves the store in either the pre- or the post-state of that statement.
pub async fn bounded<T, F>(limit: Duration, op: &'static str, fut: F) -> ServiceResult<T>
where
    F: Future<Output = ServiceResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                op,
                timeout_ms = limit.as_millis() as u64,
                "storage round-trip timed out"
            );
            Err(ServiceError::StorageTimeout(limit))
        }
    }
}
