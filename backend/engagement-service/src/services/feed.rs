use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FeedConfig;
use crate::domain::{
    EntityId, FeedEntity, FeedQuery, Page, SortDirection, SortField, SortSpec,
};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{bounded, FeedSource};

/// Unvalidated listing parameters as callers supply them.
#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub text: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
    pub scope: Option<EntityId>,
}

/// Composes filter, sort and pagination into one query against a collection.
///
/// One planner per entity kind; the backend behind [`FeedSource`] does the execution.
pub struct FeedQueryPlanner<T: FeedEntity> {
    source: Arc<dyn FeedSource<T>>,
    config: FeedConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T: FeedEntity> Clone for FeedQueryPlanner<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: FeedEntity> FeedQueryPlanner<T> {
    pub fn new(source: Arc<dyn FeedSource<T>>, config: FeedConfig) -> Self {
        Self {
            source,
            config,
            _entity: PhantomData,
        }
    }

    /// Validate caller parameters and apply defaults. Nothing is clamped.
    pub fn plan(&self, request: FeedRequest) -> ServiceResult<FeedQuery> {
        let page = self.config.page_request(request.page, request.limit)?;

        let field = match request.sort_by.as_deref() {
            None => SortField::default(),
            Some(raw) => raw.parse()?,
        };
        let direction = match request.sort_type.as_deref() {
            None => SortDirection::default(),
            Some(raw) => raw.parse()?,
        };
        if !T::SORT_FIELDS.contains(&field) {
            return Err(ServiceError::Validation(format!(
                "Invalid 'sortBy' value: {}",
                field.api_name()
            )));
        }

        Ok(FeedQuery::new(page)
            .with_text(request.text)
            .with_scope(request.scope)
            .with_sort(SortSpec::new(field, direction)))
    }

    pub async fn query(&self, query: &FeedQuery, timeout: Duration) -> ServiceResult<Page<T>> {
        if !T::SORT_FIELDS.contains(&query.sort.field) {
            return Err(ServiceError::Validation(format!(
                "Invalid 'sortBy' value: {}",
                query.sort.field.api_name()
            )));
        }

        let page = bounded(timeout, "feed.execute", self.source.execute(query)).await?;
        tracing::debug!(
            table = T::TABLE,
            page = page.page,
            returned = page.items.len(),
            total = page.total_count,
            "feed query executed"
        );
        Ok(page)
    }

    /// `plan` followed by `query`.
    pub async fn run(&self, request: FeedRequest, timeout: Duration) -> ServiceResult<Page<T>> {
        let query = self.plan(request)?;
        self.query(&query, timeout).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Video};
    use crate::repository::MemoryStore;
    use chrono::{Duration as ChronoDuration, Utc};

    fn planner<T: FeedEntity>(store: &MemoryStore) -> FeedQueryPlanner<T>
    where
        MemoryStore: FeedSource<T>,
    {
        FeedQueryPlanner::new(Arc::new(store.clone()), FeedConfig::default())
    }

    #[test]
    fn defaults_to_first_page_newest_first() {
        let store = MemoryStore::new();
        let query = planner::<Video>(&store).plan(FeedRequest::default()).unwrap();

        assert_eq!(query.page.number(), 1);
        assert_eq!(query.page.size(), 10);
        assert_eq!(query.sort, SortSpec::recency());
        assert!(query.text.is_none());
    }

    #[test]
    fn rejects_invalid_parameters_without_clamping() {
        let store = MemoryStore::new();
        let videos = planner::<Video>(&store);

        for request in [
            FeedRequest {
                page: Some(0),
                ..Default::default()
            },
            FeedRequest {
                limit: Some(51),
                ..Default::default()
            },
            FeedRequest {
                limit: Some(0),
                ..Default::default()
            },
            FeedRequest {
                sort_type: Some("up".into()),
                ..Default::default()
            },
            FeedRequest {
                sort_by: Some("views".into()),
                ..Default::default()
            },
        ] {
            assert!(matches!(
                videos.plan(request),
                Err(ServiceError::Validation(_))
            ));
        }
    }

    #[test]
    fn comments_only_sort_by_recency() {
        let store = MemoryStore::new();
        let err = planner::<Comment>(&store)
            .plan(FeedRequest {
                sort_by: Some("title".into()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn configured_max_can_be_lower_than_hard_limit() {
        let store = MemoryStore::new();
        let strict = FeedQueryPlanner::<Video>::new(
            Arc::new(store),
            FeedConfig {
                default_page_size: 5,
                max_page_size: 20,
            },
        );
        assert!(strict
            .plan(FeedRequest {
                limit: Some(25),
                ..Default::default()
            })
            .is_err());
        assert_eq!(strict.plan(FeedRequest::default()).unwrap().page.size(), 5);
    }

    #[tokio::test]
    async fn sorts_by_title_with_requested_direction() {
        let store = MemoryStore::new();
        let owner = EntityId::new();
        for (i, title) in ["bravo", "alpha", "charlie"].iter().enumerate() {
            store.put_video(Video {
                id: EntityId::new(),
                owner,
                title: title.to_string(),
                description: String::new(),
                video_file_url: format!("https://cdn.example/{}.mp4", title),
                thumbnail_url: String::new(),
                duration: 10.0 * i as f64,
                created_at: Utc::now() - ChronoDuration::minutes(i as i64),
            });
        }

        let page = planner::<Video>(&store)
            .run(
                FeedRequest {
                    sort_by: Some("title".into()),
                    sort_type: Some("asc".into()),
                    ..Default::default()
                },
                Duration::from_secs(1),
            )
            .await
            .unwrap();

        let titles: Vec<_> = page.items.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(titles, ["alpha", "bravo", "charlie"]);
        assert_eq!(page.total_count, 3);
    }
}
