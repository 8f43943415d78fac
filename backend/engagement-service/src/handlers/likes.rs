/// Like handlers - toggle likes on videos, comments and posts
use actix_web::{web, HttpResponse};
use serde::Serialize;

use super::{empty, ApiResponse, AppState};
use crate::domain::{EdgeKind, EdgeTarget, EntityId};
use crate::error::ServiceResult;
use crate::services::{RequestContext, ToggleOutcome, ToggleState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub liked_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn toggle_response(outcome: ToggleOutcome, noun: &str) -> HttpResponse {
    match (outcome.state, outcome.edge) {
        (ToggleState::Created, Some(edge)) => ApiResponse::ok(edge, format!("{} liked", noun)),
        _ => ApiResponse::ok(empty(), format!("{} unliked", noun)),
    }
}

async fn toggle_like(
    state: &AppState,
    ctx: &RequestContext,
    target: EdgeTarget,
    noun: &str,
) -> ServiceResult<HttpResponse> {
    let outcome = state.toggles.toggle(ctx, EdgeKind::Like, target).await?;
    Ok(toggle_response(outcome, noun))
}

/// POST /likes/v/{video_id}
pub async fn toggle_video_like(
    state: web::Data<AppState>,
    ctx: RequestContext,
    video_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let id = EntityId::parse("videoId", &video_id)?;
    toggle_like(&state, &ctx, EdgeTarget::video(id), "Video").await
}

/// GET /likes/v/{video_id}
pub async fn get_video_like_state(
    state: web::Data<AppState>,
    ctx: RequestContext,
    video_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let id = EntityId::parse("videoId", &video_id)?;
    let edge = state
        .toggles
        .current(&ctx, EdgeKind::Like, EdgeTarget::video(id))
        .await?;
    let like = LikeState {
        liked: edge.is_some(),
        liked_at: edge.map(|e| e.created_at),
    };
    Ok(ApiResponse::ok(like, "Like state fetched successfully"))
}

/// POST /likes/c/{comment_id}
pub async fn toggle_comment_like(
    state: web::Data<AppState>,
    ctx: RequestContext,
    comment_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let id = EntityId::parse("commentId", &comment_id)?;
    toggle_like(&state, &ctx, EdgeTarget::comment(id), "Comment").await
}

/// POST /likes/p/{post_id}
pub async fn toggle_post_like(
    state: web::Data<AppState>,
    ctx: RequestContext,
    post_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let id = EntityId::parse("postId", &post_id)?;
    toggle_like(&state, &ctx, EdgeTarget::post(id), "Post").await
}

/// GET /likes/videos
pub async fn get_liked_videos(
    state: web::Data<AppState>,
    ctx: RequestContext,
) -> ServiceResult<HttpResponse> {
    let videos = state
        .projector
        .liked_videos(ctx.actor_id, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
