/// Comment handlers - HTTP endpoints for a video's comment thread
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use validator::Validate;

use super::{empty, ApiResponse, AppState, PaginationParams};
use crate::domain::EntityId;
use crate::error::{ServiceError, ServiceResult};
use crate::services::RequestContext;

/// Request body for creating or editing a comment
#[derive(Debug, Deserialize, Validate)]
pub struct CommentBody {
    #[serde(alias = "comment")]
    #[validate(length(min = 1, max = 5000, message = "Comment content is required"))]
    pub content: String,
}

impl CommentBody {
    fn checked(&self) -> ServiceResult<&str> {
        self.validate()
            .map_err(|e| ServiceError::Validation(e.to_string()))?;
        Ok(&self.content)
    }
}

/// GET /comments/{video_id}
pub async fn get_video_comments(
    state: web::Data<AppState>,
    ctx: RequestContext,
    video_id: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let video_id = EntityId::parse("videoId", &video_id)?;
    let page = query.page_request(&state.feed)?;
    let comments = state.comments.list(video_id, page, ctx.timeout).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

/// POST /comments/{video_id}
pub async fn add_comment(
    state: web::Data<AppState>,
    ctx: RequestContext,
    video_id: web::Path<String>,
    body: web::Json<CommentBody>,
) -> ServiceResult<HttpResponse> {
    let video_id = EntityId::parse("videoId", &video_id)?;
    let comment = state
        .comments
        .add(&ctx, video_id, body.checked()?)
        .await?;
    Ok(ApiResponse::created(comment, "Comment added successfully"))
}

/// PATCH /comments/c/{comment_id}
pub async fn update_comment(
    state: web::Data<AppState>,
    ctx: RequestContext,
    comment_id: web::Path<String>,
    body: web::Json<CommentBody>,
) -> ServiceResult<HttpResponse> {
    let comment_id = EntityId::parse("commentId", &comment_id)?;
    let comment = state
        .comments
        .update(comment_id, body.checked()?, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(comment, "Comment updated successfully"))
}

/// DELETE /comments/c/{comment_id}
pub async fn delete_comment(
    state: web::Data<AppState>,
    ctx: RequestContext,
    comment_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let comment_id = EntityId::parse("commentId", &comment_id)?;
    state.comments.remove(comment_id, ctx.timeout).await?;
    Ok(ApiResponse::ok(empty(), "Comment deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_comment_alias_and_rejects_empty() {
        let body: CommentBody = serde_json::from_str(r#"{"comment":"nice"}"#).unwrap();
        assert_eq!(body.checked().unwrap(), "nice");

        let empty: CommentBody = serde_json::from_str(r#"{"content":""}"#).unwrap();
        assert!(matches!(empty.checked(), Err(ServiceError::Validation(_))));
    }
}
