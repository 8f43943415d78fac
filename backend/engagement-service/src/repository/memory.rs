//! In-process backend used by tests and `STORAGE_BACKEND=memory`.
//!
//! Edge uniqueness is enforced atomically per key by the map's entry API, so racing
//! toggles on one key serialize inside a single process. It gives no guarantee across
//! processes; multi-instance deployments must use the Postgres backend.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::{CommentStore, EdgeStore, FeedSource, PlaylistStore, UserDirectory, VideoCatalog};
use crate::domain::{
    Comment, Edge, EdgeKey, EdgeKind, EdgeTarget, EntityId, FeedEntity, FeedQuery, Page,
    Playlist, Post, TargetType, User, Video,
};
use crate::error::ServiceResult;

#[derive(Clone, Default)]
pub struct MemoryStore {
    edges: Arc<DashMap<EdgeKey, Edge>>,
    users: Arc<DashMap<EntityId, User>>,
    videos: Arc<DashMap<EntityId, Video>>,
    comments: Arc<DashMap<EntityId, Comment>>,
    posts: Arc<DashMap<EntityId, Post>>,
    playlists: Arc<DashMap<EntityId, Playlist>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_user(&self, user: User) {
        self.users.insert(user.id, user);
    }

    pub fn remove_user(&self, id: EntityId) -> Option<User> {
        self.users.remove(&id).map(|(_, user)| user)
    }

    pub fn put_video(&self, video: Video) {
        self.videos.insert(video.id, video);
    }

    pub fn remove_video(&self, id: EntityId) -> Option<Video> {
        self.videos.remove(&id).map(|(_, video)| video)
    }

    pub fn put_post(&self, post: Post) {
        self.posts.insert(post.id, post);
    }

    pub fn put_playlist(&self, playlist: Playlist) {
        self.playlists.insert(playlist.id, playlist);
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn sorted_edges<F>(&self, keep: F) -> Vec<Edge>
    where
        F: Fn(&Edge) -> bool,
    {
        let mut edges: Vec<Edge> = self
            .edges
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        edges.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        edges
    }
}

/// Filter, order and slice a snapshot of a collection.
fn run_feed<T, I>(rows: I, query: &FeedQuery) -> Page<T>
where
    T: FeedEntity,
    I: Iterator<Item = T>,
{
    let mut matched: Vec<T> = rows.filter(|row| query.matches(row)).collect();
    matched.sort_by(|a, b| query.compare(a, b));

    let total = matched.len() as u64;
    let items = matched
        .into_iter()
        .skip(query.page.offset() as usize)
        .take(query.page.size() as usize)
        .collect();

    Page::new(items, total, query.page)
}

#[async_trait]
impl EdgeStore for MemoryStore {
    async fn insert(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        match self.edges.entry(key) {
            Entry::Occupied(_) => Ok(None),
            Entry::Vacant(slot) => {
                let edge = Edge::new(key, Utc::now());
                slot.insert(edge.clone());
                Ok(Some(edge))
            }
        }
    }

    async fn delete(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        Ok(self.edges.remove(&key).map(|(_, edge)| edge))
    }

    async fn find(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        Ok(self.edges.get(&key).map(|edge| edge.value().clone()))
    }

    async fn list_by_target(&self, target: EdgeTarget) -> ServiceResult<Vec<Edge>> {
        Ok(self.sorted_edges(|edge| edge.target == target))
    }

    async fn list_by_actor(
        &self,
        actor_id: EntityId,
        kind: EdgeKind,
        target_type: Option<TargetType>,
    ) -> ServiceResult<Vec<Edge>> {
        Ok(self.sorted_edges(|edge| {
            edge.actor_id == actor_id
                && edge.kind == kind
                && target_type.map_or(true, |t| edge.target.kind == t)
        }))
    }
}

#[async_trait]
impl FeedSource<Video> for MemoryStore {
    async fn execute(&self, query: &FeedQuery) -> ServiceResult<Page<Video>> {
        Ok(run_feed(
            self.videos.iter().map(|entry| entry.value().clone()),
            query,
        ))
    }
}

#[async_trait]
impl FeedSource<Comment> for MemoryStore {
    async fn execute(&self, query: &FeedQuery) -> ServiceResult<Page<Comment>> {
        Ok(run_feed(
            self.comments.iter().map(|entry| entry.value().clone()),
            query,
        ))
    }
}

#[async_trait]
impl FeedSource<Post> for MemoryStore {
    async fn execute(&self, query: &FeedQuery) -> ServiceResult<Page<Post>> {
        Ok(run_feed(
            self.posts.iter().map(|entry| entry.value().clone()),
            query,
        ))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn fetch_users(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, User>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.users.get(id).map(|user| (*id, user.value().clone())))
            .collect())
    }
}

#[async_trait]
impl VideoCatalog for MemoryStore {
    async fn get_video(&self, id: EntityId) -> ServiceResult<Option<Video>> {
        Ok(self.videos.get(&id).map(|video| video.value().clone()))
    }

    async fn fetch_videos(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, Video>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.videos.get(id).map(|video| (*id, video.value().clone())))
            .collect())
    }
}

#[async_trait]
impl CommentStore for MemoryStore {
    async fn insert_comment(&self, comment: Comment) -> ServiceResult<Comment> {
        self.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn update_content(
        &self,
        comment_id: EntityId,
        content: String,
    ) -> ServiceResult<Option<Comment>> {
        Ok(self.comments.get_mut(&comment_id).map(|mut comment| {
            comment.content = content;
            comment.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: EntityId) -> ServiceResult<bool> {
        Ok(self.comments.remove(&comment_id).is_some())
    }
}

#[async_trait]
impl PlaylistStore for MemoryStore {
    async fn list_by_owner(&self, owner_id: EntityId) -> ServiceResult<Vec<Playlist>> {
        let mut playlists: Vec<Playlist> = self
            .playlists
            .iter()
            .filter(|entry| entry.owner_id == owner_id)
            .map(|entry| entry.value().clone())
            .collect();
        playlists.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(playlists)
    }

    async fn append_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>> {
        Ok(self.playlists.get_mut(&playlist_id).map(|mut playlist| {
            playlist.video_ids.push(video_id);
            playlist.clone()
        }))
    }

    async fn remove_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>> {
        Ok(self.playlists.get_mut(&playlist_id).map(|mut playlist| {
            playlist.video_ids.retain(|id| *id != video_id);
            playlist.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn insert_rejects_duplicate_key() {
        let store = MemoryStore::new();
        let key = EdgeKey::new(EntityId::new(), EdgeTarget::video(EntityId::new()));

        let first = store.insert(key).await.unwrap();
        let second = store.insert(key).await.unwrap();

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.edge_count(), 1);
    }

    #[tokio::test]
    async fn delete_of_missing_edge_is_none() {
        let store = MemoryStore::new();
        let key = EdgeKey::new(EntityId::new(), EdgeTarget::channel(EntityId::new()));

        assert!(store.delete(key).await.unwrap().is_none());
        store.insert(key).await.unwrap();
        assert!(store.delete(key).await.unwrap().is_some());
        assert!(store.find(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn same_target_id_under_different_types_is_distinct() {
        let store = MemoryStore::new();
        let actor = EntityId::new();
        let shared = EntityId::new();

        store
            .insert(EdgeKey::new(actor, EdgeTarget::video(shared)))
            .await
            .unwrap();
        let post_like = store
            .insert(EdgeKey::new(actor, EdgeTarget::post(shared)))
            .await
            .unwrap();

        assert!(post_like.is_some());
        assert_eq!(store.edge_count(), 2);
    }

    #[tokio::test]
    async fn list_by_actor_filters_kind_and_target_type() {
        let store = MemoryStore::new();
        let actor = EntityId::new();
        for target in [
            EdgeTarget::video(EntityId::new()),
            EdgeTarget::comment(EntityId::new()),
            EdgeTarget::channel(EntityId::new()),
        ] {
            store.insert(EdgeKey::new(actor, target)).await.unwrap();
        }

        let likes = store
            .list_by_actor(actor, EdgeKind::Like, None)
            .await
            .unwrap();
        assert_eq!(likes.len(), 2);

        let video_likes = store
            .list_by_actor(actor, EdgeKind::Like, Some(TargetType::Video))
            .await
            .unwrap();
        assert_eq!(video_likes.len(), 1);

        let subs = store
            .list_by_actor(actor, EdgeKind::Subscription, None)
            .await
            .unwrap();
        assert_eq!(subs.len(), 1);
    }

    fn playlist(owner: EntityId) -> Playlist {
        Playlist {
            id: EntityId::new(),
            owner_id: owner,
            name: "mix".to_string(),
            description: String::new(),
            video_ids: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn playlist_append_keeps_duplicates_and_remove_strips_all() {
        let store = MemoryStore::new();
        let list = playlist(EntityId::new());
        store.put_playlist(list.clone());
        let (a, b) = (EntityId::new(), EntityId::new());

        for video in [a, b, a] {
            store.append_video(list.id, video).await.unwrap();
        }
        let stored = store.list_by_owner(list.owner_id).await.unwrap();
        assert_eq!(stored[0].video_ids, vec![a, b, a]);

        // the inherent `remove_video` seed helper shadows the trait method
        let updated = PlaylistStore::remove_video(&store, list.id, a)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.video_ids, vec![b]);

        assert!(store
            .append_video(EntityId::new(), a)
            .await
            .unwrap()
            .is_none());
    }
}
