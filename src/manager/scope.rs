use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::ScopeError;
use crate::models::{RescanOutcome, ScanTask, TaskOutcome};
use crate::scope::{ScopeTarget, TargetValidator};
use crate::store::TaskStore;
use super::cache::ScopeCache;

/// Snapshot of in-flight work, served to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScopeStatus {
    pub pending: usize,
    pub dispatched: usize,
    pub stale: usize,
    pub dispatch_timeout_secs: u64,
    pub pending_tasks: Vec<ScanTask>,
    pub dispatched_tasks: Vec<ScanTask>,
}

/// Coordinates rescan requests, worker claims and stale-dispatch recovery.
///
/// All cache mutations happen under the write side of one lock, and that lock
/// is held across the store call, so each decision is atomic with respect to
/// every other decision made through this manager. The task store stays the
/// source of truth: the cache is only changed after the store confirms.
pub struct ScopeManager {
    store: Arc<dyn TaskStore>,
    validator: TargetValidator,
    dispatch_timeout: Duration,
    cache: RwLock<ScopeCache>,
}

/// NotFound, InvalidTransition and Conflict mean the store moved on without us.
fn diverged(e: &ScopeError) -> bool {
    matches!(
        e,
        ScopeError::NotFound(_) | ScopeError::InvalidTransition(_) | ScopeError::Conflict(_)
    )
}

fn give_up(operation: &str, e: ScopeError) -> ScopeError {
    warn!(operation, error = %e, "Task store still disagrees after refresh");
    ScopeError::StoreUnavailable(format!("{} could not be applied after refresh: {}", operation, e))
}

impl ScopeManager {
    /// Build a manager with an empty cache. Call [`refresh`](Self::refresh)
    /// before serving to pick up tasks already in the store.
    pub fn new(store: Arc<dyn TaskStore>, validator: TargetValidator, dispatch_timeout: Duration) -> Self {
        Self {
            store,
            validator,
            dispatch_timeout,
            cache: RwLock::new(ScopeCache::default()),
        }
    }

    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    pub fn validator(&self) -> &TargetValidator {
        &self.validator
    }

    pub async fn request_rescan(&self, target: &str, requester_id: &str) -> Result<RescanOutcome, ScopeError> {
        let target = match self.validator.explain(target) {
            Ok(t) => t.to_string(),
            Err(ScopeError::Validation(reason)) => {
                info!(target = %target, requester = requester_id, reason = %reason, "Rescan rejected");
                return Ok(RescanOutcome::Rejected(reason));
            }
            Err(e) => return Err(e),
        };

        let mut cache = self.cache.write().await;
        match self.decide_rescan(&mut cache, &target, requester_id).await {
            Err(e) if diverged(&e) => {
                debug!(target = %target, error = %e, "Cache diverged from store, refreshing");
                self.reload(&mut cache).await?;
                self.decide_rescan(&mut cache, &target, requester_id).await
                    .map_err(|e| if diverged(&e) { give_up("request_rescan", e) } else { e })
            }
            other => other,
        }
    }

    async fn decide_rescan(
        &self,
        cache: &mut ScopeCache,
        target: &str,
        requester_id: &str,
    ) -> Result<RescanOutcome, ScopeError> {
        if let Some(task) = cache.dispatched(target) {
            if !task.is_stale(Utc::now(), self.dispatch_timeout) {
                debug!(target = %target, task_id = %task.id, "Rescan already dispatched");
                return Ok(RescanOutcome::AlreadyDispatched);
            }
            let task_id = task.id.clone();
            let reverted = self.store.mark_pending(&task_id).await?;
            cache.remove_dispatched(target);
            cache.insert_pending(reverted.clone());
            info!(target = %target, task_id = %task_id, "Stale dispatch re-queued on request");
            return Ok(RescanOutcome::Refreshed(reverted));
        }

        if cache.pending(target).is_some() {
            debug!(target = %target, "Rescan already pending");
            return Ok(RescanOutcome::AlreadyPending);
        }

        let task = self.store.create_task(target, requester_id).await?;
        cache.insert_pending(task.clone());
        info!(target = %target, task_id = %task.id, requester = requester_id, "Rescan task created");
        Ok(RescanOutcome::Created(task))
    }

    /// Hand the oldest pending task to a worker. Returns `None` when there is
    /// no pending work.
    pub async fn claim_next_pending(&self) -> Result<Option<ScanTask>, ScopeError> {
        let mut cache = self.cache.write().await;

        for attempt in 0..2 {
            let (task_id, target) = match cache.front_pending() {
                Some(task) => (task.id.clone(), task.target.clone()),
                None => return Ok(None),
            };

            match self.store.mark_dispatched(&task_id, Utc::now()).await {
                Ok(task) => {
                    cache.remove_pending(&target);
                    cache.insert_dispatched(task.clone());
                    info!(target = %target, task_id = %task_id, "Task dispatched");
                    return Ok(Some(task));
                }
                Err(e) if diverged(&e) && attempt == 0 => {
                    debug!(task_id = %task_id, error = %e, "Cache diverged from store, refreshing");
                    self.reload(&mut cache).await?;
                }
                Err(e) if diverged(&e) => return Err(give_up("claim_next_pending", e)),
                Err(e) => return Err(e),
            }
        }

        Ok(None)
    }

    /// Record a worker's report and drop the task from the dispatched cache.
    ///
    /// If the store refuses and a refresh shows the task is no longer
    /// dispatched, the store's error is returned as-is: the report arrived
    /// for work that was already re-queued or finished.
    pub async fn report_completion(&self, task_id: &str, outcome: TaskOutcome) -> Result<ScanTask, ScopeError> {
        let mut cache = self.cache.write().await;

        let mut attempt = 0;
        loop {
            let result = match &outcome {
                TaskOutcome::Completed { result_ref } => self.store.mark_completed(task_id, result_ref).await,
                TaskOutcome::Failed { reason } => self.store.mark_failed(task_id, reason).await,
            };

            match result {
                Ok(task) => {
                    cache.remove_dispatched(&task.target);
                    info!(target = %task.target, task_id, status = %task.status, "Task finished");
                    return Ok(task);
                }
                Err(e) if diverged(&e) && attempt == 0 => {
                    debug!(task_id, error = %e, "Report refused by store, refreshing");
                    self.reload(&mut cache).await?;
                    if !cache.is_dispatched_id(task_id) {
                        warn!(task_id, error = %e, "Report for a task that is no longer dispatched");
                        return Err(e);
                    }
                    attempt += 1;
                }
                Err(e) if diverged(&e) => return Err(give_up("report_completion", e)),
                Err(e) => return Err(e),
            }
        }
    }

    /// Revert every dispatched task older than `timeout` to pending. Returns
    /// the re-queued tasks.
    pub async fn sweep_stale_dispatches(&self, timeout: Duration) -> Result<Vec<ScanTask>, ScopeError> {
        let mut cache = self.cache.write().await;
        let now = Utc::now();
        let stale: Vec<ScanTask> = cache.dispatched_tasks()
            .into_iter()
            .filter(|t| t.is_stale(now, timeout))
            .collect();

        let mut reverted = Vec::with_capacity(stale.len());
        let mut needs_reload = false;
        for task in stale {
            match self.store.mark_pending(&task.id).await {
                Ok(requeued) => {
                    cache.remove_dispatched(&task.target);
                    cache.insert_pending(requeued.clone());
                    info!(target = %task.target, task_id = %task.id, "Stale dispatch re-queued by sweep");
                    reverted.push(requeued);
                }
                Err(e) if diverged(&e) => {
                    debug!(task_id = %task.id, error = %e, "Stale task already handled elsewhere");
                    needs_reload = true;
                }
                Err(e) => return Err(e),
            }
        }

        if needs_reload {
            self.reload(&mut cache).await?;
        }
        Ok(reverted)
    }

    async fn reload(&self, cache: &mut ScopeCache) -> Result<(), ScopeError> {
        let tasks = self.store.list_active_tasks().await?;
        *cache = ScopeCache::from_tasks(tasks);
        debug!(pending = cache.pending_len(), dispatched = cache.dispatched_len(), "Scope cache reloaded");
        Ok(())
    }

    /// Reload both caches from the store.
    pub async fn refresh(&self) -> Result<(), ScopeError> {
        let mut cache = self.cache.write().await;
        self.reload(&mut cache).await
    }

    pub async fn refresh_pending_rescans(&self) -> Result<(), ScopeError> {
        let mut cache = self.cache.write().await;
        let tasks = self.store.list_active_tasks().await?;
        cache.replace_pending(&tasks);
        Ok(())
    }

    pub async fn refresh_dispatched_rescans(&self) -> Result<(), ScopeError> {
        let mut cache = self.cache.write().await;
        let tasks = self.store.list_active_tasks().await?;
        cache.replace_dispatched(&tasks);
        Ok(())
    }

    /// Read a task straight from the store, terminal tasks included.
    pub async fn get_task(&self, task_id: &str) -> Result<Option<ScanTask>, ScopeError> {
        self.store.get_task(task_id).await
    }

    /// Audit trail of every task recorded for a target, newest first. The
    /// target is normalized the same way rescan requests are.
    pub async fn task_history(&self, target: &str, limit: usize, offset: usize) -> Result<Vec<ScanTask>, ScopeError> {
        let target = ScopeTarget::parse(target)?;
        self.store.list_tasks_for_target(&target.to_string(), limit, offset).await
    }

    /// Pending tasks in the order they will be claimed.
    pub async fn pending_tasks(&self) -> Vec<ScanTask> {
        self.cache.read().await.pending_tasks()
    }

    pub async fn dispatched_tasks(&self) -> Vec<ScanTask> {
        self.cache.read().await.dispatched_tasks()
    }

    pub async fn status(&self) -> ScopeStatus {
        let cache = self.cache.read().await;
        let now = Utc::now();
        let dispatched_tasks = cache.dispatched_tasks();
        ScopeStatus {
            pending: cache.pending_len(),
            dispatched: cache.dispatched_len(),
            stale: dispatched_tasks.iter().filter(|t| t.is_stale(now, self.dispatch_timeout)).count(),
            dispatch_timeout_secs: self.dispatch_timeout.as_secs(),
            pending_tasks: cache.pending_tasks(),
            dispatched_tasks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use async_trait::async_trait;
    use chrono::DateTime;
    use futures::future::join_all;
    use crate::db::Database;
    use crate::models::TaskStatus;

    /// Wraps the SQLite store to count calls and simulate an outage.
    struct CountingStore {
        inner: Database,
        calls: AtomicUsize,
        down: AtomicBool,
    }

    impl CountingStore {
        fn new(inner: Database) -> Self {
            Self { inner, calls: AtomicUsize::new(0), down: AtomicBool::new(false) }
        }

        fn enter(&self) -> Result<(), ScopeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.down.load(Ordering::SeqCst) {
                return Err(ScopeError::StoreUnavailable("database is locked".into()));
            }
            Ok(())
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TaskStore for CountingStore {
        async fn create_task(&self, target: &str, requester_id: &str) -> Result<ScanTask, ScopeError> {
            self.enter()?;
            self.inner.create_task(target, requester_id).await
        }
        async fn mark_dispatched(&self, task_id: &str, at: DateTime<Utc>) -> Result<ScanTask, ScopeError> {
            self.enter()?;
            self.inner.mark_dispatched(task_id, at).await
        }
        async fn mark_pending(&self, task_id: &str) -> Result<ScanTask, ScopeError> {
            self.enter()?;
            self.inner.mark_pending(task_id).await
        }
        async fn mark_completed(&self, task_id: &str, result_ref: &str) -> Result<ScanTask, ScopeError> {
            self.enter()?;
            self.inner.mark_completed(task_id, result_ref).await
        }
        async fn mark_failed(&self, task_id: &str, reason: &str) -> Result<ScanTask, ScopeError> {
            self.enter()?;
            self.inner.mark_failed(task_id, reason).await
        }
        async fn list_active_tasks(&self) -> Result<Vec<ScanTask>, ScopeError> {
            self.enter()?;
            self.inner.list_active_tasks().await
        }
        async fn get_task(&self, task_id: &str) -> Result<Option<ScanTask>, ScopeError> {
            self.enter()?;
            self.inner.get_task(task_id).await
        }
        async fn list_tasks_for_target(&self, target: &str, limit: usize, offset: usize) -> Result<Vec<ScanTask>, ScopeError> {
            self.enter()?;
            self.inner.list_tasks_for_target(target, limit, offset).await
        }
    }

    const TIMEOUT: Duration = Duration::from_secs(1200);

    fn setup() -> (Arc<ScopeManager>, Arc<CountingStore>, Database) {
        let db = Database::in_memory().unwrap();
        let store = Arc::new(CountingStore::new(db.clone()));
        let validator = TargetValidator::from_rules(
            &["10.0.0.0/8", "*.example.org"],
            &["10.0.0.1"],
        ).unwrap();
        let manager = Arc::new(ScopeManager::new(store.clone(), validator, TIMEOUT));
        (manager, store, db)
    }

    fn created(outcome: RescanOutcome) -> ScanTask {
        match outcome {
            RescanOutcome::Created(task) => task,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    /// Dispatch `task_id` directly in the store as if it happened `ago` in the past.
    async fn dispatch_in_past(db: &Database, task_id: &str, ago: chrono::Duration) {
        db.mark_dispatched(task_id, Utc::now() - ago).await.unwrap();
    }

    #[tokio::test]
    async fn test_created_then_already_pending() {
        let (manager, _, _) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        assert_eq!(task.target, "10.0.0.5");
        assert_eq!(task.status, TaskStatus::Pending);

        let second = manager.request_rescan("10.0.0.5", "user2").await.unwrap();
        assert_eq!(second, RescanOutcome::AlreadyPending);
        assert_eq!(manager.pending_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_targets_are_normalized_before_dedup() {
        let (manager, _, _) = setup();
        created(manager.request_rescan("Web.Example.org", "user1").await.unwrap());
        let second = manager.request_rescan(" web.example.ORG ", "user2").await.unwrap();
        assert_eq!(second, RescanOutcome::AlreadyPending);
    }

    #[tokio::test]
    async fn test_rejected_makes_no_store_call() {
        let (manager, store, _) = setup();
        let outcome = manager.request_rescan("not-an-ip-and-not-in-scope", "user1").await.unwrap();
        assert!(matches!(outcome, RescanOutcome::Rejected(_)));

        let outcome = manager.request_rescan("10.0.0.1", "user1").await.unwrap();
        assert!(matches!(outcome, RescanOutcome::Rejected(ref r) if r.contains("excluded")));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_already_dispatched_while_fresh() {
        let (manager, _, _) = setup();
        created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        let claimed = manager.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.status, TaskStatus::Dispatched);
        assert!(claimed.dispatched_at.is_some());

        let outcome = manager.request_rescan("10.0.0.5", "user2").await.unwrap();
        assert_eq!(outcome, RescanOutcome::AlreadyDispatched);
    }

    #[tokio::test]
    async fn test_stale_dispatch_refreshed_on_request() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &task.id, chrono::Duration::seconds(1201)).await;
        manager.refresh().await.unwrap();

        let outcome = manager.request_rescan("10.0.0.5", "user2").await.unwrap();
        let refreshed = match outcome {
            RescanOutcome::Refreshed(t) => t,
            other => panic!("expected Refreshed, got {:?}", other),
        };
        assert_eq!(refreshed.id, task.id);
        assert_eq!(refreshed.status, TaskStatus::Pending);
        assert!(refreshed.queued_at > task.queued_at);
        assert!(refreshed.dispatched_at.is_none());

        let stored = db.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Pending);
        assert!(manager.dispatched_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_refreshed_task_goes_to_back_of_queue() {
        let (manager, _, db) = setup();
        let stale = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &stale.id, chrono::Duration::seconds(1300)).await;
        let other = created(manager.request_rescan("10.0.0.6", "user1").await.unwrap());
        manager.refresh().await.unwrap();

        let requeued = manager.sweep_stale_dispatches(TIMEOUT).await.unwrap();
        assert_eq!(requeued.len(), 1);

        let order: Vec<_> = manager.pending_tasks().await.into_iter().map(|t| t.id).collect();
        assert_eq!(order, vec![other.id, stale.id]);
    }

    #[tokio::test]
    async fn test_claim_drains_in_creation_order_exactly_once() {
        let (manager, _, _) = setup();
        let mut ids = Vec::new();
        for i in 2..12 {
            ids.push(created(manager.request_rescan(&format!("10.0.0.{}", i), "user1").await.unwrap()).id);
        }

        let mut claimed = Vec::new();
        while let Some(task) = manager.claim_next_pending().await.unwrap() {
            claimed.push(task.id);
        }
        assert_eq!(claimed, ids);
        assert!(manager.claim_next_pending().await.unwrap().is_none());
        assert_eq!(manager.dispatched_tasks().await.len(), 10);
    }

    #[tokio::test]
    async fn test_complete_lifecycle_leaves_terminal_record() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        manager.claim_next_pending().await.unwrap().unwrap();

        let done = manager.report_completion(
            &task.id,
            TaskOutcome::Completed { result_ref: "scan-123".into() },
        ).await.unwrap();
        assert_eq!(done.status, TaskStatus::Completed);

        let stored = db.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Completed);
        assert_eq!(stored.result_ref.as_deref(), Some("scan-123"));
        assert!(stored.completed_at.is_some());

        let status = manager.status().await;
        assert_eq!(status.pending, 0);
        assert_eq!(status.dispatched, 0);

        // A terminal task does not block a new request
        created(manager.request_rescan("10.0.0.5", "user2").await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_report_records_reason() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        manager.claim_next_pending().await.unwrap().unwrap();
        manager.report_completion(&task.id, TaskOutcome::Failed { reason: "host unreachable".into() })
            .await.unwrap();

        let stored = db.get_task(&task.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TaskStatus::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("host unreachable"));
        assert!(manager.dispatched_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_report_for_unknown_task_is_not_found() {
        let (manager, _, _) = setup();
        let err = manager.report_completion("no-such-task", TaskOutcome::Failed { reason: "x".into() })
            .await.unwrap_err();
        assert!(matches!(err, ScopeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_report_after_requeue_is_refused() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &task.id, chrono::Duration::seconds(1500)).await;
        manager.refresh().await.unwrap();
        manager.sweep_stale_dispatches(TIMEOUT).await.unwrap();

        let err = manager.report_completion(&task.id, TaskOutcome::Completed { result_ref: "late".into() })
            .await.unwrap_err();
        assert!(matches!(err, ScopeError::InvalidTransition(_)));
        assert_eq!(manager.pending_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_is_idempotent() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &task.id, chrono::Duration::seconds(1201)).await;
        manager.refresh().await.unwrap();

        assert_eq!(manager.sweep_stale_dispatches(TIMEOUT).await.unwrap().len(), 1);
        assert!(manager.sweep_stale_dispatches(TIMEOUT).await.unwrap().is_empty());
        assert_eq!(db.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Pending);
    }

    #[tokio::test]
    async fn test_sweep_leaves_fresh_dispatches() {
        let (manager, _, _) = setup();
        created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        manager.claim_next_pending().await.unwrap().unwrap();

        assert!(manager.sweep_stale_dispatches(TIMEOUT).await.unwrap().is_empty());
        assert_eq!(manager.dispatched_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_tolerates_task_finished_elsewhere() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &task.id, chrono::Duration::seconds(1300)).await;
        manager.refresh().await.unwrap();
        db.mark_completed(&task.id, "scan-1").await.unwrap();

        assert!(manager.sweep_stale_dispatches(TIMEOUT).await.unwrap().is_empty());
        assert!(manager.dispatched_tasks().await.is_empty());
        assert!(manager.pending_tasks().await.is_empty());
    }

    #[tokio::test]
    async fn test_conflict_from_store_becomes_already_pending() {
        let (manager, _, db) = setup();
        // Another process created the task; our cache has never seen it
        db.create_task("10.0.0.5", "other").await.unwrap();

        let outcome = manager.request_rescan("10.0.0.5", "user1").await.unwrap();
        assert_eq!(outcome, RescanOutcome::AlreadyPending);
        assert_eq!(manager.pending_tasks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_claim_recovers_from_divergence() {
        let (manager, _, db) = setup();
        let first = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        let second = created(manager.request_rescan("10.0.0.6", "user1").await.unwrap());

        // Another process claimed the first task
        db.mark_dispatched(&first.id, Utc::now()).await.unwrap();

        let claimed = manager.claim_next_pending().await.unwrap().unwrap();
        assert_eq!(claimed.id, second.id);
        assert_eq!(manager.dispatched_tasks().await.len(), 2);
    }

    #[tokio::test]
    async fn test_store_outage_leaves_cache_untouched() {
        let (manager, store, _) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());

        store.down.store(true, Ordering::SeqCst);
        let err = manager.request_rescan("10.0.0.6", "user1").await.unwrap_err();
        assert!(matches!(err, ScopeError::StoreUnavailable(_)));
        assert!(err.is_retryable());

        let err = manager.claim_next_pending().await.unwrap_err();
        assert!(matches!(err, ScopeError::StoreUnavailable(_)));

        let pending = manager.pending_tasks().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, task.id);
        assert!(manager.dispatched_tasks().await.is_empty());

        store.down.store(false, Ordering::SeqCst);
        assert_eq!(manager.claim_next_pending().await.unwrap().unwrap().id, task.id);
    }

    #[tokio::test]
    async fn test_refresh_rebuilds_from_store() {
        let (manager, _, db) = setup();
        let a = db.create_task("10.0.0.5", "user1").await.unwrap();
        let b = db.create_task("10.0.0.6", "user1").await.unwrap();
        db.mark_dispatched(&b.id, Utc::now()).await.unwrap();

        manager.refresh_pending_rescans().await.unwrap();
        assert_eq!(manager.pending_tasks().await[0].id, a.id);
        assert!(manager.dispatched_tasks().await.is_empty());

        manager.refresh_dispatched_rescans().await.unwrap();
        assert_eq!(manager.dispatched_tasks().await[0].id, b.id);

        let status = manager.status().await;
        assert_eq!((status.pending, status.dispatched, status.stale), (1, 1, 0));
        assert_eq!(status.dispatch_timeout_secs, 1200);
    }

    #[tokio::test]
    async fn test_pending_refresh_drops_dispatch_finished_elsewhere() {
        let (manager, _, db) = setup();
        let first = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        assert_eq!(manager.claim_next_pending().await.unwrap().unwrap().id, first.id);

        // Another process completed the scan and queued a successor
        db.mark_completed(&first.id, "scan-1").await.unwrap();
        let successor = db.create_task("10.0.0.5", "other").await.unwrap();

        manager.refresh_pending_rescans().await.unwrap();
        assert!(manager.dispatched_tasks().await.is_empty());
        assert_eq!(manager.pending_tasks().await[0].id, successor.id);

        let outcome = manager.request_rescan("10.0.0.5", "user2").await.unwrap();
        assert_eq!(outcome, RescanOutcome::AlreadyPending);
        assert_eq!(manager.status().await.dispatched, 0);
    }

    #[tokio::test]
    async fn test_dispatched_refresh_drops_pending_claimed_elsewhere() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        db.mark_dispatched(&task.id, Utc::now()).await.unwrap();

        manager.refresh_dispatched_rescans().await.unwrap();
        assert!(manager.pending_tasks().await.is_empty());
        assert_eq!(manager.dispatched_tasks().await[0].id, task.id);
        assert!(manager.claim_next_pending().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_task_history_and_lookup() {
        let (manager, _, _) = setup();
        let first = created(manager.request_rescan("Web.Example.org", "user1").await.unwrap());
        manager.claim_next_pending().await.unwrap();
        manager.report_completion(&first.id, TaskOutcome::Failed { reason: "x".into() }).await.unwrap();
        let second = created(manager.request_rescan("web.example.org", "user2").await.unwrap());

        let history = manager.task_history("WEB.example.org", 10, 0).await.unwrap();
        let ids: Vec<_> = history.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

        assert_eq!(manager.get_task(&first.id).await.unwrap().unwrap().status, TaskStatus::Failed);
        assert!(manager.get_task("missing").await.unwrap().is_none());
        assert!(manager.task_history("bad input", 10, 0).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_create_exactly_once() {
        let (manager, _, db) = setup();

        let handles = (0..32).map(|i| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move {
                manager.request_rescan("10.0.0.5", &format!("user{}", i)).await
            })
        });
        let outcomes: Vec<RescanOutcome> = join_all(handles).await
            .into_iter()
            .map(|r| r.unwrap().unwrap())
            .collect();

        let creates = outcomes.iter().filter(|o| matches!(o, RescanOutcome::Created(_))).count();
        let dupes = outcomes.iter()
            .filter(|o| matches!(o, RescanOutcome::AlreadyPending | RescanOutcome::AlreadyDispatched))
            .count();
        assert_eq!(creates, 1);
        assert_eq!(dupes, 31);
        assert_eq!(db.list_active_tasks().await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_never_share_a_task() {
        let (manager, _, _) = setup();
        for i in 2..22 {
            created(manager.request_rescan(&format!("10.0.0.{}", i), "user1").await.unwrap());
        }

        let handles = (0..40).map(|_| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.claim_next_pending().await })
        });
        let mut ids: Vec<String> = join_all(handles).await
            .into_iter()
            .filter_map(|r| r.unwrap().unwrap())
            .map(|t| t.id)
            .collect();
        assert_eq!(ids.len(), 20);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 20);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stale_task_reverted_once_under_race() {
        let (manager, _, db) = setup();
        let task = created(manager.request_rescan("10.0.0.5", "user1").await.unwrap());
        dispatch_in_past(&db, &task.id, chrono::Duration::seconds(1201)).await;
        manager.refresh().await.unwrap();

        let sweeper = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.sweep_stale_dispatches(TIMEOUT).await })
        };
        let requester = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.request_rescan("10.0.0.5", "user2").await })
        };

        let swept = sweeper.await.unwrap().unwrap();
        let outcome = requester.await.unwrap().unwrap();

        let by_sweep = swept.len() == 1;
        let by_request = matches!(outcome, RescanOutcome::Refreshed(_));
        assert!(by_sweep ^ by_request);
        if by_sweep {
            assert_eq!(outcome, RescanOutcome::AlreadyPending);
        }
        assert_eq!(db.get_task(&task.id).await.unwrap().unwrap().status, TaskStatus::Pending);
    }
}
