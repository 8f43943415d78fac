/// HTTP handlers for engagement endpoints
///
/// - Likes: toggle on videos/comments/posts, like state, liked videos
/// - Subscriptions: toggle, channel subscribers, subscribed channels
/// - Videos: search/list feed, fetch one
/// - Comments: per-video thread
/// - Posts: per-user feed
/// - Playlists: per-user listing, add/remove videos
///
/// Authentication happens upstream; the gateway forwards the resolved user id in
/// `x-user-id`.
pub mod comments;
pub mod likes;
pub mod playlists;
pub mod posts;
pub mod subscriptions;
pub mod videos;

use actix_web::{dev::Payload, web, FromRequest, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, FeedConfig};
use crate::domain::{EntityId, PageRequest, Post, Video};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{
    CommentStore, EdgeStore, FeedSource, PlaylistStore, UserDirectory, VideoCatalog,
};
use crate::services::{
    CommentThread, FeedQueryPlanner, PlaylistService, RelationshipProjector, RequestContext,
    ToggleEngine, TogglePolicy,
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const TIMEOUT_HEADER: &str = "x-request-timeout-ms";

/// Shared per-process state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub toggles: ToggleEngine,
    pub projector: RelationshipProjector,
    pub videos: FeedQueryPlanner<Video>,
    pub posts: FeedQueryPlanner<Post>,
    pub comments: CommentThread,
    pub playlists: PlaylistService,
    pub catalog: Arc<dyn VideoCatalog>,
    pub feed: FeedConfig,
    pub storage_timeout: Duration,
}

impl AppState {
    /// Wire every service to one storage backend.
    pub fn new<S>(store: Arc<S>, config: &Config) -> Self
    where
        S: EdgeStore
            + FeedSource<Video>
            + FeedSource<Post>
            + FeedSource<crate::domain::Comment>
            + UserDirectory
            + VideoCatalog
            + CommentStore
            + PlaylistStore
            + 'static,
    {
        let policy = TogglePolicy {
            reject_self_subscription: config.toggle.reject_self_subscription,
        };

        Self {
            toggles: ToggleEngine::new(store.clone(), policy),
            projector: RelationshipProjector::new(store.clone(), store.clone(), store.clone()),
            videos: FeedQueryPlanner::<Video>::new(store.clone(), config.feed.clone()),
            posts: FeedQueryPlanner::<Post>::new(store.clone(), config.feed.clone()),
            comments: CommentThread::new(
                FeedQueryPlanner::<crate::domain::Comment>::new(
                    store.clone(),
                    config.feed.clone(),
                ),
                store.clone(),
            ),
            playlists: PlaylistService::new(store.clone()),
            catalog: store,
            feed: config.feed.clone(),
            storage_timeout: config.storage.timeout(),
        }
    }
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Ok().json(Self {
            status_code: 200,
            data,
            message: message.into(),
            success: true,
        })
    }

    pub fn created(data: T, message: impl Into<String>) -> HttpResponse {
        HttpResponse::Created().json(Self {
            status_code: 201,
            data,
            message: message.into(),
            success: true,
        })
    }
}

/// Empty `data` payload (`{}`).
pub fn empty() -> serde_json::Value {
    serde_json::json!({})
}

fn context_from_request(req: &HttpRequest) -> ServiceResult<RequestContext> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ServiceError::Internal("AppState not configured".to_string()))?;

    let raw_actor = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServiceError::Unauthorized("Missing x-user-id header".to_string()))?;
    let actor_id = EntityId::parse(USER_ID_HEADER, raw_actor)
        .map_err(|_| ServiceError::Unauthorized("Invalid x-user-id header".to_string()))?;

    let timeout = match req.headers().get(TIMEOUT_HEADER) {
        None => state.storage_timeout,
        Some(raw) => raw
            .to_str()
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| {
                ServiceError::Validation(format!("{} must be a positive integer", TIMEOUT_HEADER))
            })?,
    };

    Ok(RequestContext::new(actor_id, timeout))
}

impl FromRequest for RequestContext {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(context_from_request(req))
    }
}

/// Parse an optional numeric query parameter.
pub(crate) fn parse_number(field: &str, raw: Option<&str>) -> ServiceResult<Option<i64>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| {
            ServiceError::Validation(format!(
                "Invalid '{}' value. It must be a positive number.",
                field
            ))
        }),
    }
}

/// Raw `page`/`limit` pair shared by the non-searchable listings.
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl PaginationParams {
    pub(crate) fn page_request(&self, feed: &FeedConfig) -> ServiceResult<PageRequest> {
        feed.page_request(
            parse_number("page", self.page.as_deref())?,
            parse_number("limit", self.limit.as_deref())?,
        )
    }
}

/// Register all engagement routes under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| {
        ServiceError::Validation(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _| {
        ServiceError::Validation(format!("Invalid query string: {}", err)).into()
    }))
    .service(
        web::scope("/api/v1")
            .service(
                web::scope("/likes")
                    .route("/videos", web::get().to(likes::get_liked_videos))
                    .route("/v/{video_id}", web::post().to(likes::toggle_video_like))
                    .route("/v/{video_id}", web::get().to(likes::get_video_like_state))
                    .route("/c/{comment_id}", web::post().to(likes::toggle_comment_like))
                    .route("/p/{post_id}", web::post().to(likes::toggle_post_like)),
            )
            .service(
                web::scope("/subscriptions")
                    .route(
                        "/c/{channel_id}",
                        web::post().to(subscriptions::toggle_subscription),
                    )
                    .route(
                        "/c/{channel_id}",
                        web::get().to(subscriptions::get_channel_subscribers),
                    )
                    .route(
                        "/u/{subscriber_id}",
                        web::get().to(subscriptions::get_subscribed_channels),
                    ),
            )
            .service(
                web::scope("/videos")
                    .route("", web::get().to(videos::list_videos))
                    .route("/{video_id}", web::get().to(videos::get_video)),
            )
            .service(
                web::scope("/comments")
                    .route("/c/{comment_id}", web::patch().to(comments::update_comment))
                    .route("/c/{comment_id}", web::delete().to(comments::delete_comment))
                    .route("/{video_id}", web::get().to(comments::get_video_comments))
                    .route("/{video_id}", web::post().to(comments::add_comment)),
            )
            .service(
                web::scope("/posts").route("/u/{user_id}", web::get().to(posts::get_user_posts)),
            )
            .service(
                web::scope("/playlist")
                    .route("/user/{user_id}", web::get().to(playlists::get_user_playlists))
                    .route(
                        "/add/{video_id}/{playlist_id}",
                        web::patch().to(playlists::add_video_to_playlist),
                    )
                    .route(
                        "/remove/{video_id}/{playlist_id}",
                        web::patch().to(playlists::remove_video_from_playlist),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_number_accepts_absent_and_rejects_garbage() {
        assert_eq!(parse_number("page", None).unwrap(), None);
        assert_eq!(parse_number("page", Some("")).unwrap(), None);
        assert_eq!(parse_number("page", Some(" 3 ")).unwrap(), Some(3));
        assert!(matches!(
            parse_number("limit", Some("ten")),
            Err(ServiceError::Validation(msg)) if msg.contains("limit")
        ));
    }

    #[test]
    fn envelope_uses_camel_case() {
        let body = serde_json::to_value(ApiResponse {
            status_code: 200,
            data: empty(),
            message: "ok".to_string(),
            success: true,
        })
        .unwrap();
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"], serde_json::json!({}));
        assert_eq!(body["success"], true);
    }
}
