/// Video handlers - searchable video feed and single video lookup
use actix_web::{web, HttpResponse};
use serde::Deserialize;

use super::{parse_number, ApiResponse, AppState};
use crate::domain::EntityId;
use crate::error::{ServiceError, ServiceResult};
use crate::repository::bounded;
use crate::services::{FeedRequest, RequestContext};

/// Raw query string; numbers arrive as text so malformed values become validation errors.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoFeedParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub query: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub user_id: Option<String>,
}

impl VideoFeedParams {
    pub fn into_request(self) -> ServiceResult<FeedRequest> {
        let scope = match self.user_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(EntityId::parse("userId", raw)?),
        };
        Ok(FeedRequest {
            page: parse_number("page", self.page.as_deref())?,
            limit: parse_number("limit", self.limit.as_deref())?,
            text: self.query,
            sort_by: self.sort_by,
            sort_type: self.sort_type,
            scope,
        })
    }
}

/// GET /videos
pub async fn list_videos(
    state: web::Data<AppState>,
    ctx: RequestContext,
    params: web::Query<VideoFeedParams>,
) -> ServiceResult<HttpResponse> {
    let request = params.into_inner().into_request()?;
    let page = state.videos.run(request, ctx.timeout).await?;
    Ok(ApiResponse::ok(page, "Videos fetched successfully"))
}

/// GET /videos/{video_id}
pub async fn get_video(
    state: web::Data<AppState>,
    ctx: RequestContext,
    video_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let id = EntityId::parse("videoId", &video_id)?;
    let video = bounded(ctx.timeout, "videos.get", state.catalog.get_video(id))
        .await?
        .ok_or_else(|| ServiceError::NotFound("Video not found".to_string()))?;
    Ok(ApiResponse::ok(video, "Video fetched successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_textual_numbers_and_scope() {
        let owner = EntityId::new();
        let request = VideoFeedParams {
            page: Some("2".into()),
            limit: Some("5".into()),
            query: Some("music".into()),
            user_id: Some(owner.to_string()),
            ..Default::default()
        }
        .into_request()
        .unwrap();

        assert_eq!(request.page, Some(2));
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.scope, Some(owner));
        assert_eq!(request.text.as_deref(), Some("music"));
    }

    #[test]
    fn rejects_non_numeric_page_and_bad_user_id() {
        let bad_page = VideoFeedParams {
            page: Some("two".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_page.into_request(),
            Err(ServiceError::Validation(_))
        ));

        let bad_user = VideoFeedParams {
            user_id: Some("not-a-uuid".into()),
            ..Default::default()
        };
        assert!(matches!(
            bad_user.into_request(),
            Err(ServiceError::Validation(_))
        ));
    }
}
