use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::RequestContext;
use crate::domain::{Edge, EdgeKey, EdgeKind, EdgeTarget};
use crate::error::{ServiceError, ServiceResult};
use crate::repository::{bounded, EdgeStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ToggleState {
    Created,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub state: ToggleState,
    /// The new edge when `state` is `Created`
    pub edge: Option<Edge>,
}

impl ToggleOutcome {
    fn created(edge: Edge) -> Self {
        Self {
            state: ToggleState::Created,
            edge: Some(edge),
        }
    }

    fn removed() -> Self {
        Self {
            state: ToggleState::Removed,
            edge: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TogglePolicy {
    pub reject_self_subscription: bool,
}

impl Default for TogglePolicy {
    fn default() -> Self {
        Self {
            reject_self_subscription: true,
        }
    }
}

/// Atomic create-or-remove of a relationship edge.
///
/// Never reads before writing: it attempts the insert and lets the store's uniqueness
/// constraint decide. A rejected insert means an edge exists (possibly created by a
/// racing request), so the engine deletes it. A delete that finds nothing means a racing
/// toggle already removed it, which is reported as `Removed`.
///
/// Existence of the target entity is not checked here.
#[derive(Clone)]
pub struct ToggleEngine {
    store: Arc<dyn EdgeStore>,
    policy: TogglePolicy,
}

impl ToggleEngine {
    pub fn new(store: Arc<dyn EdgeStore>, policy: TogglePolicy) -> Self {
        Self { store, policy }
    }

    pub async fn toggle(
        &self,
        ctx: &RequestContext,
        kind: EdgeKind,
        target: EdgeTarget,
    ) -> ServiceResult<ToggleOutcome> {
        self.validate(ctx, kind, target)?;
        let key = EdgeKey::new(ctx.actor_id, target);

        if let Some(edge) = bounded(ctx.timeout, "edges.insert", self.store.insert(key)).await? {
            debug!(
                actor_id = %ctx.actor_id,
                target_type = %target.kind,
                target_id = %target.id,
                edge_id = %edge.id,
                "edge created"
            );
            return Ok(ToggleOutcome::created(edge));
        }

        match bounded(ctx.timeout, "edges.delete", self.store.delete(key)).await? {
            Some(edge) => {
                debug!(
                    actor_id = %ctx.actor_id,
                    target_type = %target.kind,
                    target_id = %target.id,
                    edge_id = %edge.id,
                    "edge removed"
                );
            }
            None => {
                warn!(
                    actor_id = %ctx.actor_id,
                    target_type = %target.kind,
                    target_id = %target.id,
                    "edge vanished between conflicting insert and delete; treating as removed"
                );
            }
        }
        Ok(ToggleOutcome::removed())
    }

    /// Current edge for the actor, if any. Callers that retry toggles after a timeout
    /// read this first to avoid flipping state twice.
    pub async fn current(
        &self,
        ctx: &RequestContext,
        kind: EdgeKind,
        target: EdgeTarget,
    ) -> ServiceResult<Option<Edge>> {
        self.validate(ctx, kind, target)?;
        let key = EdgeKey::new(ctx.actor_id, target);
        bounded(ctx.timeout, "edges.find", self.store.find(key)).await
    }

    fn validate(
        &self,
        ctx: &RequestContext,
        kind: EdgeKind,
        target: EdgeTarget,
    ) -> ServiceResult<()> {
        if !kind.accepts(target.kind) {
            return Err(ServiceError::Validation(format!(
                "{} cannot target a {}",
                kind.as_str(),
                target.kind
            )));
        }
        if kind == EdgeKind::Subscription
            && self.policy.reject_self_subscription
            && ctx.actor_id == target.id
        {
            return Err(ServiceError::Validation(
                "A channel cannot subscribe to itself".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityId, TargetType};
    use crate::repository::MemoryStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Store whose insert/delete answers are fixed up front, for driving the conflict
    /// branches without relying on scheduling.
    #[derive(Default)]
    struct ScriptedStore {
        insert: Mutex<Option<ServiceResult<Option<Edge>>>>,
        insert_delay: Option<Duration>,
        delete: Mutex<Option<ServiceResult<Option<Edge>>>>,
        deletes: AtomicUsize,
    }

    impl ScriptedStore {
        fn new(
            insert: ServiceResult<Option<Edge>>,
            delete: Option<ServiceResult<Option<Edge>>>,
        ) -> Self {
            Self {
                insert: Mutex::new(Some(insert)),
                delete: Mutex::new(delete),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl EdgeStore for ScriptedStore {
        async fn insert(&self, _key: EdgeKey) -> ServiceResult<Option<Edge>> {
            if let Some(delay) = self.insert_delay {
                tokio::time::sleep(delay).await;
            }
            self.insert.lock().unwrap().take().expect("unscripted insert")
        }

        async fn delete(&self, _key: EdgeKey) -> ServiceResult<Option<Edge>> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.delete.lock().unwrap().take().expect("unscripted delete")
        }

        async fn find(&self, _key: EdgeKey) -> ServiceResult<Option<Edge>> {
            Ok(None)
        }

        async fn list_by_target(&self, _target: EdgeTarget) -> ServiceResult<Vec<Edge>> {
            Ok(Vec::new())
        }

        async fn list_by_actor(
            &self,
            _actor_id: EntityId,
            _kind: EdgeKind,
            _target_type: Option<TargetType>,
        ) -> ServiceResult<Vec<Edge>> {
            Ok(Vec::new())
        }
    }

    fn scripted(store: ScriptedStore) -> (Arc<ScriptedStore>, ToggleEngine) {
        let store = Arc::new(store);
        let engine = ToggleEngine::new(store.clone(), TogglePolicy::default());
        (store, engine)
    }

    fn engine(store: &MemoryStore) -> ToggleEngine {
        ToggleEngine::new(Arc::new(store.clone()), TogglePolicy::default())
    }

    fn ctx(actor: EntityId) -> RequestContext {
        RequestContext::new(actor, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn first_toggle_creates_second_removes() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let actor = EntityId::new();
        let video = EdgeTarget::video(EntityId::new());

        let first = engine
            .toggle(&ctx(actor), EdgeKind::Like, video)
            .await
            .unwrap();
        assert_eq!(first.state, ToggleState::Created);
        let edge = first.edge.unwrap();
        assert_eq!(edge.actor_id, actor);
        assert_eq!(edge.target, video);

        let second = engine
            .toggle(&ctx(actor), EdgeKind::Like, video)
            .await
            .unwrap();
        assert_eq!(second, ToggleOutcome::removed());
        assert_eq!(store.edge_count(), 0);
    }

    #[tokio::test]
    async fn rejects_mismatched_target_kind() {
        let store = MemoryStore::new();
        let engine = engine(&store);

        let err = engine
            .toggle(
                &ctx(EntityId::new()),
                EdgeKind::Subscription,
                EdgeTarget::video(EntityId::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = engine
            .toggle(
                &ctx(EntityId::new()),
                EdgeKind::Like,
                EdgeTarget::channel(EntityId::new()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(store.edge_count(), 0);
    }

    #[tokio::test]
    async fn self_subscription_follows_policy() {
        let store = MemoryStore::new();
        let me = EntityId::new();

        let err = engine(&store)
            .toggle(&ctx(me), EdgeKind::Subscription, EdgeTarget::channel(me))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let permissive = ToggleEngine::new(
            Arc::new(store.clone()),
            TogglePolicy {
                reject_self_subscription: false,
            },
        );
        let outcome = permissive
            .toggle(&ctx(me), EdgeKind::Subscription, EdgeTarget::channel(me))
            .await
            .unwrap();
        assert_eq!(outcome.state, ToggleState::Created);
    }

    #[tokio::test]
    async fn current_reflects_toggle_state() {
        let store = MemoryStore::new();
        let engine = engine(&store);
        let actor = EntityId::new();
        let post = EdgeTarget::post(EntityId::new());

        assert!(engine
            .current(&ctx(actor), EdgeKind::Like, post)
            .await
            .unwrap()
            .is_none());
        engine
            .toggle(&ctx(actor), EdgeKind::Like, post)
            .await
            .unwrap();
        assert!(engine
            .current(&ctx(actor), EdgeKind::Like, post)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn conflict_then_empty_delete_is_a_removed_no_op() {
        let (store, engine) = scripted(ScriptedStore::new(Ok(None), Some(Ok(None))));

        let outcome = engine
            .toggle(
                &ctx(EntityId::new()),
                EdgeKind::Like,
                EdgeTarget::video(EntityId::new()),
            )
            .await
            .unwrap();

        assert_eq!(outcome.state, ToggleState::Removed);
        assert!(outcome.edge.is_none());
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn conflict_is_resolved_by_deleting_the_winning_edge() {
        let actor = EntityId::new();
        let target = EdgeTarget::comment(EntityId::new());
        let winner = Edge::new(EdgeKey::new(actor, target), Utc::now());
        let (store, engine) = scripted(ScriptedStore::new(Ok(None), Some(Ok(Some(winner)))));

        let outcome = engine
            .toggle(&ctx(actor), EdgeKind::Like, target)
            .await
            .unwrap();

        assert_eq!(outcome, ToggleOutcome::removed());
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn insert_failure_is_surfaced_without_a_delete() {
        let (store, engine) = scripted(ScriptedStore::new(
            Err(ServiceError::StorageTimeout(Duration::from_millis(5))),
            None,
        ));

        let err = engine
            .toggle(
                &ctx(EntityId::new()),
                EdgeKind::Like,
                EdgeTarget::post(EntityId::new()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::StorageTimeout(_)));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn slow_insert_times_out_before_any_delete() {
        let (store, engine) = scripted(ScriptedStore {
            insert_delay: Some(Duration::from_secs(1)),
            ..ScriptedStore::new(Ok(None), Some(Ok(None)))
        });
        let ctx = RequestContext::new(EntityId::new(), Duration::from_millis(20));

        let err = engine
            .toggle(&ctx, EdgeKind::Like, EdgeTarget::video(EntityId::new()))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::StorageTimeout(d) if d == Duration::from_millis(20)));
        assert_eq!(store.deletes.load(Ordering::SeqCst), 0);
    }
}
