use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::feed::FeedQueryPlanner;
use super::RequestContext;
use crate::domain::{Comment, EntityId, FeedQuery, Page, PageRequest, SortSpec};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{bounded, CommentStore};

/// Comments scoped to one video.
///
/// Provides mechanism only: `update` and `remove` take just the comment id and do not
/// check who owns the comment. Ownership policy belongs to the caller's authorization
/// layer. `add` does not verify that the video exists.
#[derive(Clone)]
pub struct CommentThread {
    feed: FeedQueryPlanner<Comment>,
    store: Arc<dyn CommentStore>,
}

fn normalize_content(content: &str) -> ServiceResult<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(
            "Comment content is required".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

impl CommentThread {
    pub fn new(feed: FeedQueryPlanner<Comment>, store: Arc<dyn CommentStore>) -> Self {
        Self { feed, store }
    }

    /// Newest first, no text filter.
    pub async fn list(
        &self,
        video_id: EntityId,
        page: PageRequest,
        timeout: Duration,
    ) -> ServiceResult<Page<Comment>> {
        let query = FeedQuery::new(page)
            .with_scope(Some(video_id))
            .with_sort(SortSpec::recency());
        self.feed.query(&query, timeout).await
    }

    pub async fn add(
        &self,
        ctx: &RequestContext,
        video_id: EntityId,
        content: &str,
    ) -> ServiceResult<Comment> {
        let comment = Comment {
            id: EntityId::new(),
            video_id,
            owner_id: ctx.actor_id,
            content: normalize_content(content)?,
            created_at: Utc::now(),
        };
        let comment = bounded(
            ctx.timeout,
            "comments.insert",
            self.store.insert_comment(comment),
        )
        .await?;
        tracing::debug!(comment_id = %comment.id, video_id = %video_id, "comment added");
        Ok(comment)
    }

    pub async fn update(
        &self,
        comment_id: EntityId,
        content: &str,
        timeout: Duration,
    ) -> ServiceResult<Comment> {
        let content = normalize_content(content)?;
        bounded(
            timeout,
            "comments.update",
            self.store.update_content(comment_id, content),
        )
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Comment {} does not exist", comment_id)))
    }

    /// Removing a comment that does not exist is a no-op.
    pub async fn remove(&self, comment_id: EntityId, timeout: Duration) -> ServiceResult<()> {
        let removed = bounded(
            timeout,
            "comments.delete",
            self.store.delete_comment(comment_id),
        )
        .await?;
        if !removed {
            tracing::debug!(comment_id = %comment_id, "comment already absent");
        }
        Ok(())
    }
}
