use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use super::PgStore;
use crate::domain::{Comment, EntityId, User, Video};
use crate::error::ServiceResult;
use crate::repository::{CommentStore, UserDirectory, VideoCatalog};

fn uuids(ids: &[EntityId]) -> Vec<Uuid> {
    ids.iter().map(EntityId::as_uuid).collect()
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn fetch_users(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, User>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, avatar
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(users.into_iter().map(|user| (user.id, user)).collect())
    }
}

#[async_trait]
impl VideoCatalog for PgStore {
    async fn get_video(&self, id: EntityId) -> ServiceResult<Option<Video>> {
        let video = sqlx::query_as::<_, Video>(
            r#"
            SELECT id, owner, title, description, video_file_url, thumbnail_url, duration, created_at
            FROM videos
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    async fn fetch_videos(&self, ids: &[EntityId]) -> ServiceResult<HashMap<EntityId, Video>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let videos = sqlx::query_as::<_, Video>(
            r#"
            SELECT id, owner, title, description, video_file_url, thumbnail_url, duration, created_at
            FROM videos
            WHERE id = ANY($1)
            "#,
        )
        .bind(uuids(ids))
        .fetch_all(&self.pool)
        .await?;

        Ok(videos.into_iter().map(|video| (video.id, video)).collect())
    }
}

#[async_trait]
impl CommentStore for PgStore {
    async fn insert_comment(&self, comment: Comment) -> ServiceResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (id, video_id, owner_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, video_id, owner_id, content, created_at
            "#,
        )
        .bind(comment.id.as_uuid())
        .bind(comment.video_id.as_uuid())
        .bind(comment.owner_id.as_uuid())
        .bind(comment.content)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn update_content(
        &self,
        comment_id: EntityId,
        content: String,
    ) -> ServiceResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE comments
            SET content = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, video_id, owner_id, content, created_at
            "#,
        )
        .bind(comment_id.as_uuid())
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn delete_comment(&self, comment_id: EntityId) -> ServiceResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
