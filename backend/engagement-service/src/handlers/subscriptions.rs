/// Subscription handlers - channel subscribe toggle and subscription lists
use actix_web::{web, HttpResponse};

use super::{empty, ApiResponse, AppState};
use crate::domain::{EdgeKind, EdgeTarget, EntityId};
use crate::error::ServiceResult;
use crate::services::{RequestContext, ToggleState};

/// POST /subscriptions/c/{channel_id}
pub async fn toggle_subscription(
    state: web::Data<AppState>,
    ctx: RequestContext,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = EntityId::parse("channelId", &channel_id)?;
    let outcome = state
        .toggles
        .toggle(&ctx, EdgeKind::Subscription, EdgeTarget::channel(channel_id))
        .await?;

    Ok(match (outcome.state, outcome.edge) {
        (ToggleState::Created, Some(edge)) => {
            ApiResponse::ok(edge, "Subscribed to channel successfully")
        }
        _ => ApiResponse::ok(empty(), "Unsubscribed from channel successfully"),
    })
}

/// GET /subscriptions/c/{channel_id}
pub async fn get_channel_subscribers(
    state: web::Data<AppState>,
    ctx: RequestContext,
    channel_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let channel_id = EntityId::parse("channelId", &channel_id)?;
    let subscribers = state
        .projector
        .channel_subscribers(channel_id, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(
        subscribers,
        "Channel subscribers fetched successfully",
    ))
}

/// GET /subscriptions/u/{subscriber_id}
pub async fn get_subscribed_channels(
    state: web::Data<AppState>,
    ctx: RequestContext,
    subscriber_id: web::Path<String>,
) -> ServiceResult<HttpResponse> {
    let subscriber_id = EntityId::parse("subscriberId", &subscriber_id)?;
    let channels = state
        .projector
        .subscribed_channels(subscriber_id, ctx.timeout)
        .await?;
    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
