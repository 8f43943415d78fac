/// Playlist handlers - owner listing and video membership
use actix_web::{web, HttpResponse};

use super::{ApiResponse, AppState};
use crate::domain::EntityId;
use crate::error::ServiceResult;
use crate::services::RequestContext;

/// GET /playlist/user/{user_id}
pub async fn get_user_playlists(
    state: web::Data<AppState>,
    ctx: RequestContext,
    user_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let owner = EntityId::parse("userId", &user_id)?;
    let playlists = state.playlists.list_for_owner(owner, ctx.timeout).await?;
    Ok(ApiResponse::ok(
        playlists,
        "User playlists fetched successfully",
    ))
}

fn membership_ids(path: &(String, String)) -> ServiceResult<(EntityId, EntityId)> {
    Ok((
        EntityId::parse("videoId", &path.0)?,
        EntityId::parse("playlistId", &path.1)?,
    ))
}

/// PATCH /playlist/add/{video_id}/{playlist_id}
pub async fn add_video_to_playlist(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<(String, String)>,
) -> ServiceResult<HttpResponse> {
    let (video_id, playlist_id) = membership_ids(&path)?;
    let playlist = state
        .playlists
        .add_video(playlist_id, video_id, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(
        playlist,
        "Video id pushed successfully to playlist videos",
    ))
}

/// PATCH /playlist/remove/{video_id}/{playlist_id}
pub async fn remove_video_from_playlist(
    state: web::Data<AppState>,
    ctx: RequestContext,
    path: web::Path<(String, String)>,
) -> ServiceResult<HttpResponse> {
    let (video_id, playlist_id) = membership_ids(&path)?;
    let playlist = state
        .playlists
        .remove_video(playlist_id, video_id, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(
        playlist,
        "Video id removed successfully from playlist videos",
    ))
}
