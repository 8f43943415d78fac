use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Postgres, QueryBuilder};

use super::PgStore;
use crate::domain::{FeedEntity, FeedQuery, Page};
use crate::error::ServiceResult;
use crate::repository::FeedSource;

/// Escape LIKE metacharacters so the filter is a plain substring match.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn push_predicate<T: FeedEntity>(qb: &mut QueryBuilder<'_, Postgres>, query: &FeedQuery) {
    qb.push(" WHERE TRUE");

    if let Some(scope) = query.scope {
        qb.push(" AND ")
            .push(T::SCOPE_COLUMN)
            .push(" = ")
            .push_bind(scope.as_uuid());
    }

    if let Some(text) = &query.text {
        let pattern = format!("%{}%", escape_like(text));
        qb.push(" AND (");
        for (i, column) in T::SEARCH_COLUMNS.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column)
                .push(" ILIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }
}

/// SQL for the page itself; the count uses the same predicate.
fn page_query<T: FeedEntity>(query: &FeedQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM {}", T::COLUMNS, T::TABLE));
    push_predicate::<T>(&mut qb, query);
    qb.push(" ORDER BY ")
        .push(query.sort.field.order_expr())
        .push(" ")
        .push(query.sort.direction.as_sql())
        .push(", id ASC LIMIT ")
        .push_bind(query.page.size() as i64)
        .push(" OFFSET ")
        .push_bind(query.page.offset() as i64);
    qb
}

fn count_query<T: FeedEntity>(query: &FeedQuery) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", T::TABLE));
    push_predicate::<T>(&mut qb, query);
    qb
}

#[async_trait]
impl<T> FeedSource<T> for PgStore
where
    T: FeedEntity + for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    async fn execute(&self, query: &FeedQuery) -> ServiceResult<Page<T>> {
        let mut items_qb = page_query::<T>(query);
        let mut count_qb = count_query::<T>(query);

        let (items, total) = futures::try_join!(
            items_qb.build_query_as::<T>().fetch_all(&self.pool),
            count_qb.build_query_scalar::<i64>().fetch_one(&self.pool),
        )?;

        Ok(Page::new(items, total.max(0) as u64, query.page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Comment, EntityId, PageRequest, SortDirection, SortField, SortSpec, Video,
    };

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("music"), "music");
    }

    #[test]
    fn video_search_sql_has_total_order_and_window() {
        let query = FeedQuery::new(PageRequest::new(2, 2).unwrap())
            .with_text(Some("music".to_string()))
            .with_sort(SortSpec::new(SortField::Title, SortDirection::Asc));

        let sql = page_query::<Video>(&query).into_sql();
        assert!(sql.starts_with("SELECT id, owner, title"));
        assert!(sql.contains("(title ILIKE $1 ESCAPE '\\' OR description ILIKE $2 ESCAPE '\\')"));
        assert!(sql.contains("ORDER BY title COLLATE \"C\" ASC, id ASC LIMIT $3 OFFSET $4"));
    }

    #[test]
    fn scoped_count_sql_reuses_predicate() {
        let query = FeedQuery::new(PageRequest::new(1, 10).unwrap())
            .with_scope(Some(EntityId::new()));

        let sql = count_query::<Comment>(&query).into_sql();
        assert_eq!(sql, "SELECT COUNT(*) FROM comments WHERE TRUE AND video_id = $1");
    }
}
