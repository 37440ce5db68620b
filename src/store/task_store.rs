use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::errors::ScopeError;
use crate::models::ScanTask;

/// Durable source of truth for rescan tasks.
///
/// Every write runs in its own transaction. Transition methods fail with
/// `NotFound` for unknown ids and `InvalidTransition` when the task is not in
/// a state the transition may leave from. They return the updated record.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new Pending task at the back of the queue. Fails with
    /// `Conflict` if the target already has a Pending or Dispatched task.
    async fn create_task(&self, target: &str, requester_id: &str) -> Result<ScanTask, ScopeError>;

    /// Pending -> Dispatched, stamping `dispatched_at`.
    async fn mark_dispatched(&self, task_id: &str, at: DateTime<Utc>) -> Result<ScanTask, ScopeError>;

    /// Dispatched -> Pending, re-queued at the back.
    async fn mark_pending(&self, task_id: &str) -> Result<ScanTask, ScopeError>;

    /// Dispatched -> Completed.
    async fn mark_completed(&self, task_id: &str, result_ref: &str) -> Result<ScanTask, ScopeError>;

    /// Dispatched -> Failed.
    async fn mark_failed(&self, task_id: &str, reason: &str) -> Result<ScanTask, ScopeError>;

    /// All Pending and Dispatched tasks in queue order.
    async fn list_active_tasks(&self) -> Result<Vec<ScanTask>, ScopeError>;

    async fn get_task(&self, task_id: &str) -> Result<Option<ScanTask>, ScopeError>;

    /// Every task ever recorded for a target, newest first.
    async fn list_tasks_for_target(
        &self,
        target: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ScanTask>, ScopeError>;
}
