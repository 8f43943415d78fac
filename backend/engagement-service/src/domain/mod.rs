pub mod feed;
pub mod ids;
pub mod models;
pub mod page;

pub use feed::{FeedEntity, FeedQuery, SortDirection, SortField, SortKey, SortSpec};
pub use ids::EntityId;
pub use models::{
    Comment, Edge, EdgeKey, EdgeKind, EdgeTarget, Playlist, Post, TargetType, User, Video,
};
pub use page::{Page, PageRequest, MAX_PAGE_SIZE};
