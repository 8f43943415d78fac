//! Storage-agnostic description of a feed query: text filter, scope, sort key and
//! pagination window. Backends translate a [`FeedQuery`] into their own query form.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::str::FromStr;

use super::ids::EntityId;
use super::models::{Comment, Post, Video};
use super::page::PageRequest;
use crate::error::ServiceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ServiceError::Validation(
                "Invalid 'sortType' value. Use 'asc' or 'desc'.".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    Title,
    Duration,
}

impl SortField {
    pub fn api_name(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "createdAt",
            SortField::Title => "title",
            SortField::Duration => "duration",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::Duration => "duration",
        }
    }

    /// ORDER BY expression. Text sorts use the "C" collation, which orders UTF-8 by code
    /// point and so agrees with [`SortKey::Text`] comparison.
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortField::Title => "title COLLATE \"C\"",
            other => other.column(),
        }
    }
}

impl FromStr for SortField {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(SortField::CreatedAt),
            "title" => Ok(SortField::Title),
            "duration" => Ok(SortField::Duration),
            other => Err(ServiceError::Validation(format!(
                "Invalid 'sortBy' value: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Most recent first.
    pub fn recency() -> Self {
        Self::default()
    }
}

/// Comparable value of an entity's sort field.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Time(DateTime<Utc>),
    /// Byte-wise (code point) order
    Text(String),
    Number(f64),
}

impl SortKey {
    fn compare(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Time(a), SortKey::Time(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            // Keys of one query always come from the same field.
            _ => Ordering::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedQuery {
    /// Case-insensitive substring matched against the entity's search fields
    pub text: Option<String>,
    /// Restricts the feed to one parent (video owner, comment video, post owner)
    pub scope: Option<EntityId>,
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl FeedQuery {
    pub fn new(page: PageRequest) -> Self {
        Self {
            text: None,
            scope: None,
            sort: SortSpec::recency(),
            page,
        }
    }

    /// Blank text means "no filter".
    pub fn with_text(mut self, text: Option<String>) -> Self {
        self.text = text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self
    }

    pub fn with_scope(mut self, scope: Option<EntityId>) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches<T: FeedEntity>(&self, entity: &T) -> bool {
        if let Some(scope) = self.scope {
            if entity.scope_id() != scope {
                return false;
            }
        }
        match &self.text {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                entity
                    .search_text()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            }
        }
    }

    /// Total order: sort key in the requested direction, then id ascending.
    pub fn compare<T: FeedEntity>(&self, a: &T, b: &T) -> Ordering {
        let field = self.sort.field;
        let primary = a.sort_key(field).compare(&b.sort_key(field));
        let primary = match self.sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }
}

/// An entity that can be listed through the feed planner.
pub trait FeedEntity: Clone + Send + Sync + 'static {
    /// Backing table name
    const TABLE: &'static str;
    /// Selected columns, in `FromRow` order
    const COLUMNS: &'static str;
    /// Text columns searched by the free-text filter
    const SEARCH_COLUMNS: &'static [&'static str];
    /// Column compared against [`FeedQuery::scope`]
    const SCOPE_COLUMN: &'static str;
    /// Sort fields callers may request
    const SORT_FIELDS: &'static [SortField];

    fn id(&self) -> EntityId;
    fn scope_id(&self) -> EntityId;
    fn search_text(&self) -> Vec<&str>;
    fn sort_key(&self, field: SortField) -> SortKey;
}

impl FeedEntity for Video {
    const TABLE: &'static str = "videos";
    const COLUMNS: &'static str =
        "id, owner, title, description, video_file_url, thumbnail_url, duration, created_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["title", "description"];
    const SCOPE_COLUMN: &'static str = "owner";
    const SORT_FIELDS: &'static [SortField] =
        &[SortField::CreatedAt, SortField::Title, SortField::Duration];

    fn id(&self) -> EntityId {
        self.id
    }

    fn scope_id(&self) -> EntityId {
        self.owner
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.title, &self.description]
    }

    fn sort_key(&self, field: SortField) -> SortKey {
        match field {
            SortField::CreatedAt => SortKey::Time(self.created_at),
            SortField::Title => SortKey::Text(self.title.clone()),
            SortField::Duration => SortKey::Number(self.duration),
        }
    }
}

impl FeedEntity for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static str = "id, video_id, owner_id, content, created_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["content"];
    const SCOPE_COLUMN: &'static str = "video_id";
    const SORT_FIELDS: &'static [SortField] = &[SortField::CreatedAt];

    fn id(&self) -> EntityId {
        self.id
    }

    fn scope_id(&self) -> EntityId {
        self.video_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.content]
    }

    fn sort_key(&self, _field: SortField) -> SortKey {
        SortKey::Time(self.created_at)
    }
}

impl FeedEntity for Post {
    const TABLE: &'static str = "posts";
    const COLUMNS: &'static str = "id, owner_id, content, created_at";
    const SEARCH_COLUMNS: &'static [&'static str] = &["content"];
    const SCOPE_COLUMN: &'static str = "owner_id";
    const SORT_FIELDS: &'static [SortField] = &[SortField::CreatedAt];

    fn id(&self) -> EntityId {
        self.id
    }

    fn scope_id(&self) -> EntityId {
        self.owner_id
    }

    fn search_text(&self) -> Vec<&str> {
        vec![&self.content]
    }

    fn sort_key(&self, _field: SortField) -> SortKey {
        SortKey::Time(self.created_at)
    }
}
