pub mod comments;
pub mod feed;
pub mod playlists;
pub mod projector;
pub mod toggle;

use std::time::Duration;

use crate::domain::EntityId;

pub use comments::CommentThread;
pub use feed::{FeedQueryPlanner, FeedRequest};
pub use playlists::PlaylistService;
pub use projector::{
    JoinSide, LikedVideoRow, RelationshipProjector, SubscribedChannelRow, SubscriberRow,
};
pub use toggle::{ToggleEngine, ToggleOutcome, TogglePolicy, ToggleState};

/// Per-request context threaded through every core call.
///
/// The actor is resolved by the upstream auth layer; the timeout bounds each storage
/// round-trip the call performs.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext {
    pub actor_id: EntityId,
    pub timeout: Duration,
}

impl RequestContext {
    pub fn new(actor_id: EntityId, timeout: Duration) -> Self {
        Self { actor_id, timeout }
    }
}
