/// Post handlers - a user's post feed
use actix_web::{web, HttpResponse};

use super::{parse_number, ApiResponse, AppState, PaginationParams};
use crate::domain::EntityId;
use crate::error::ServiceResult;
use crate::services::{FeedRequest, RequestContext};

/// GET /posts/u/{user_id}
pub async fn get_user_posts(
    state: web::Data<AppState>,
    ctx: RequestContext,
    user_id: web::Path<String>,
    query: web::Query<PaginationParams>,
) -> ServiceResult<HttpResponse> {
    let owner = EntityId::parse("userId", &user_id)?;
    let request = FeedRequest {
        page: parse_number("page", query.page.as_deref())?,
        limit: parse_number("limit", query.limit.as_deref())?,
        scope: Some(owner),
        ..Default::default()
    };
    let posts = state.posts.run(request, ctx.timeout).await?;
    Ok(ApiResponse::ok(posts, "User posts fetched successfully"))
}
