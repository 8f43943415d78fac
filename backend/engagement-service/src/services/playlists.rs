use std::sync::Arc;
use std::time::Duration;

use crate::domain::{EntityId, Playlist};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{bounded, PlaylistStore};

/// Ordered video lists owned by a user.
///
/// Like comments, membership edits carry no ownership check and do not verify the
/// video exists.
#[derive(Clone)]
pub struct PlaylistService {
    store: Arc<dyn PlaylistStore>,
}

fn missing(playlist_id: EntityId) -> ServiceError {
    ServiceError::NotFound(format!("Playlist {} does not exist", playlist_id))
}

impl PlaylistService {
    pub fn new(store: Arc<dyn PlaylistStore>) -> Self {
        Self { store }
    }

    /// Newest first.
    pub async fn list_for_owner(
        &self,
        owner_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Vec<Playlist>> {
        bounded(timeout, "playlists.list", self.store.list_by_owner(owner_id)).await
    }

    /// Appends to the end; a video already present is added again.
    pub async fn add_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Playlist> {
        let playlist = bounded(
            timeout,
            "playlists.append",
            self.store.append_video(playlist_id, video_id),
        )
        .await?
        .ok_or_else(|| missing(playlist_id))?;
        tracing::debug!(playlist_id = %playlist_id, video_id = %video_id, "video appended to playlist");
        Ok(playlist)
    }

    /// Strips every occurrence; removing an absent video leaves the list unchanged.
    pub async fn remove_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
        timeout: Duration,
    ) -> ServiceResult<Playlist> {
        let playlist = bounded(
            timeout,
            "playlists.remove",
            self.store.remove_video(playlist_id, video_id),
        )
        .await?
        .ok_or_else(|| missing(playlist_id))?;
        tracing::debug!(playlist_id = %playlist_id, video_id = %video_id, "video removed from playlist");
        Ok(playlist)
    }
}
