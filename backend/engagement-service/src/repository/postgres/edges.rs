use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::domain::{Edge, EdgeKey, EdgeKind, EdgeTarget, EntityId, TargetType};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::EdgeStore;

#[derive(sqlx::FromRow)]
struct EdgeRow {
    id: Uuid,
    kind: String,
    actor_id: Uuid,
    target_type: String,
    target_id: Uuid,
    created_at: DateTime<Utc>,
}

impl TryFrom<EdgeRow> for Edge {
    type Error = ServiceError;

    fn try_from(row: EdgeRow) -> Result<Self, Self::Error> {
        let target_type: TargetType = row.target_type.parse().map_err(|_| {
            ServiceError::Internal(format!(
                "edge {} has unknown target_type {}",
                row.id, row.target_type
            ))
        })?;
        let kind = EdgeKind::of(target_type);
        if kind.as_str() != row.kind {
            return Err(ServiceError::Internal(format!(
                "edge {} kind {} does not match target_type {}",
                row.id, row.kind, row.target_type
            )));
        }

        Ok(Edge {
            id: row.id.into(),
            kind,
            actor_id: row.actor_id.into(),
            target: EdgeTarget::new(target_type, row.target_id.into()),
            created_at: row.created_at,
        })
    }
}

fn into_edges(rows: Vec<EdgeRow>) -> ServiceResult<Vec<Edge>> {
    rows.into_iter().map(Edge::try_from).collect()
}

#[async_trait]
impl EdgeStore for PgStore {
    async fn insert(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"
            INSERT INTO edges (id, kind, actor_id, target_type, target_id, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            ON CONFLICT (actor_id, target_type, target_id) DO NOTHING
            RETURNING id, kind, actor_id, target_type, target_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.kind().as_str())
        .bind(key.actor_id.as_uuid())
        .bind(key.target.kind.as_str())
        .bind(key.target.id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Edge::try_from).transpose()
    }

    async fn delete(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"
            DELETE FROM edges
            WHERE actor_id = $1 AND target_type = $2 AND target_id = $3
            RETURNING id, kind, actor_id, target_type, target_id, created_at
            "#,
        )
        .bind(key.actor_id.as_uuid())
        .bind(key.target.kind.as_str())
        .bind(key.target.id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Edge::try_from).transpose()
    }

    async fn find(&self, key: EdgeKey) -> ServiceResult<Option<Edge>> {
        let row = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT id, kind, actor_id, target_type, target_id, created_at
            FROM edges
            WHERE actor_id = $1 AND target_type = $2 AND target_id = $3
            "#,
        )
        .bind(key.actor_id.as_uuid())
        .bind(key.target.kind.as_str())
        .bind(key.target.id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Edge::try_from).transpose()
    }

    async fn list_by_target(&self, target: EdgeTarget) -> ServiceResult<Vec<Edge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT id, kind, actor_id, target_type, target_id, created_at
            FROM edges
            WHERE target_type = $1 AND target_id = $2
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        into_edges(rows)
    }

    async fn list_by_actor(
        &self,
        actor_id: EntityId,
        kind: EdgeKind,
        target_type: Option<TargetType>,
    ) -> ServiceResult<Vec<Edge>> {
        let rows = sqlx::query_as::<_, EdgeRow>(
            r#"
            SELECT id, kind, actor_id, target_type, target_id, created_at
            FROM edges
            WHERE actor_id = $1
              AND kind = $2
              AND ($3::TEXT IS NULL OR target_type = $3)
            ORDER BY created_at DESC, id ASC
            "#,
        )
        .bind(actor_id.as_uuid())
        .bind(kind.as_str())
        .bind(target_type.map(|t| t.as_str()))
        .fetch_all(&self.pool)
        .await?;

        into_edges(rows)
    }
}
