use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::domain::{EntityId, Playlist};
use crate::error::ServiceResult;
use crate::repository::PlaylistStore;

#[derive(sqlx::FromRow)]
struct PlaylistRow {
    id: Uuid,
    owner_id: Uuid,
    name: String,
    description: String,
    video_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<PlaylistRow> for Playlist {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id.into(),
            owner_id: row.owner_id.into(),
            name: row.name,
            description: row.description,
            video_ids: row.video_ids.into_iter().map(EntityId::from).collect(),
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PlaylistStore for PgStore {
    async fn list_by_owner(&self, owner_id: EntityId) -> ServiceResult<Vec<Playlist>> {
        let rows = sqlx::query_as::<_, PlaylistRow>(
            r#"
            SELECT id, owner_id, name, description, video_ids, created_at
            FROM playlists
            WHERE owner_id = $1
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(owner_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Playlist::from).collect())
    }

    async fn append_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            r#"
            UPDATE playlists
            SET video_ids = array_append(video_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, description, video_ids, created_at
            "#,
        )
        .bind(playlist_id.as_uuid())
        .bind(video_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Playlist::from))
    }

    /// `array_remove` drops every occurrence.
    async fn remove_video(
        &self,
        playlist_id: EntityId,
        video_id: EntityId,
    ) -> ServiceResult<Option<Playlist>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            r#"
            UPDATE playlists
            SET video_ids = array_remove(video_ids, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING id, owner_id, name, description, video_ids, created_at
            "#,
        )
        .bind(playlist_id.as_uuid())
        .bind(video_id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Playlist::from))
    }
}
