use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, ToSql, Transaction};
use tracing::debug;

use crate::errors::ScopeError;
use crate::models::{ScanTask, TaskStatus};
use crate::store::TaskStore;
use super::{fmt_ts, parse_ts, sql_int, Database};

const TASK_COLUMNS: &str = "id, target, requester_id, status, created_at, queued_at, queue_seq, dispatched_at, completed_at, result_ref, failure_reason";

const NEXT_QUEUE_SEQ: &str = "(SELECT COALESCE(MAX(queue_seq), 0) + 1 FROM rescan_tasks)";

struct TaskRow {
    id: String,
    target: String,
    requester_id: String,
    status: String,
    created_at: String,
    queued_at: String,
    queue_seq: i64,
    dispatched_at: Option<String>,
    completed_at: Option<String>,
    result_ref: Option<String>,
    failure_reason: Option<String>,
}

impl TaskRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            target: row.get(1)?,
            requester_id: row.get(2)?,
            status: row.get(3)?,
            created_at: row.get(4)?,
            queued_at: row.get(5)?,
            queue_seq: row.get(6)?,
            dispatched_at: row.get(7)?,
            completed_at: row.get(8)?,
            result_ref: row.get(9)?,
            failure_reason: row.get(10)?,
        })
    }

    fn into_task(self) -> Result<ScanTask, ScopeError> {
        Ok(ScanTask {
            id: self.id,
            target: self.target,
            requester_id: self.requester_id,
            status: self.status.parse()?,
            created_at: parse_ts(&self.created_at)?,
            queued_at: parse_ts(&self.queued_at)?,
            queue_seq: self.queue_seq,
            dispatched_at: self.dispatched_at.as_deref().map(parse_ts).transpose()?,
            completed_at: self.completed_at.as_deref().map(parse_ts).transpose()?,
            result_ref: self.result_ref,
            failure_reason: self.failure_reason,
        })
    }
}

fn load_task(tx: &Transaction, task_id: &str) -> Result<Option<ScanTask>, ScopeError> {
    let row = tx.query_row(
        &format!("SELECT {} FROM rescan_tasks WHERE id = ?1", TASK_COLUMNS),
        rusqlite::params![task_id],
        TaskRow::from_row,
    ).optional()?;
    row.map(TaskRow::into_task).transpose()
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    matches!(e, rusqlite::Error::SqliteFailure(code, _) if code.code == rusqlite::ErrorCode::ConstraintViolation)
}

impl Database {
    /// Apply one status transition inside a transaction. `sql` must update
    /// exactly the row `?1` and guard on the source status.
    fn transition(
        &self,
        task_id: &str,
        next: TaskStatus,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> Result<ScanTask, ScopeError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let current = load_task(&tx, task_id)?
            .ok_or_else(|| ScopeError::NotFound(format!("Task {} not found", task_id)))?;
        if !current.status.can_transition_to(next) {
            return Err(ScopeError::InvalidTransition(format!(
                "Task {} cannot move from {} to {}",
                task_id, current.status, next
            )));
        }

        let affected = tx.execute(sql, params)?;
        if affected != 1 {
            return Err(ScopeError::InvalidTransition(format!(
                "Task {} changed state during {} transition",
                task_id, next
            )));
        }

        let updated = load_task(&tx, task_id)?
            .ok_or_else(|| ScopeError::NotFound(format!("Task {} vanished during update", task_id)))?;
        tx.commit()?;

        debug!(task_id = %task_id, from = %current.status, to = %next, "Task transitioned");
        Ok(updated)
    }

    fn create_task_sync(&self, target: &str, requester_id: &str) -> Result<ScanTask, ScopeError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx.query_row(
            "SELECT id FROM rescan_tasks WHERE target = ?1 AND status IN ('pending', 'dispatched')",
            rusqlite::params![target],
            |row| row.get(0),
        ).optional()?;
        if let Some(id) = existing {
            return Err(ScopeError::Conflict(format!("Target {} already has active task {}", target, id)));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = fmt_ts(Utc::now());
        let inserted = tx.execute(
            &format!(
                "INSERT INTO rescan_tasks (id, target, requester_id, status, created_at, queued_at, queue_seq) VALUES (?1, ?2, ?3, 'pending', ?4, ?4, {})",
                NEXT_QUEUE_SEQ
            ),
            rusqlite::params![id, target, requester_id, now],
        );
        match inserted {
            Ok(_) => {}
            Err(e) if is_constraint_violation(&e) => {
                return Err(ScopeError::Conflict(format!("Target {} already has an active task", target)));
            }
            Err(e) => return Err(e.into()),
        }

        let task = load_task(&tx, &id)?
            .ok_or_else(|| ScopeError::Internal(format!("Task {} missing after insert", id)))?;
        tx.commit()?;

        debug!(task_id = %task.id, target = %target, "Task created");
        Ok(task)
    }

    fn query_tasks(&self, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<ScanTask>, ScopeError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, TaskRow::from_row)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?.into_task()?);
        }
        Ok(tasks)
    }
}

#[async_trait]
impl TaskStore for Database {
    async fn create_task(&self, target: &str, requester_id: &str) -> Result<ScanTask, ScopeError> {
        self.create_task_sync(target, requester_id)
    }

    async fn mark_dispatched(&self, task_id: &str, at: DateTime<Utc>) -> Result<ScanTask, ScopeError> {
        self.transition(
            task_id,
            TaskStatus::Dispatched,
            "UPDATE rescan_tasks SET status = 'dispatched', dispatched_at = ?2 WHERE id = ?1 AND status = 'pending'",
            rusqlite::params![task_id, fmt_ts(at)],
        )
    }

    async fn mark_pending(&self, task_id: &str) -> Result<ScanTask, ScopeError> {
        self.transition(
            task_id,
            TaskStatus::Pending,
            &format!(
                "UPDATE rescan_tasks SET status = 'pending', dispatched_at = NULL, queued_at = ?2, queue_seq = {} WHERE id = ?1 AND status = 'dispatched'",
                NEXT_QUEUE_SEQ
            ),
            rusqlite::params![task_id, fmt_ts(Utc::now())],
        )
    }

    async fn mark_completed(&self, task_id: &str, result_ref: &str) -> Result<ScanTask, ScopeError> {
        self.transition(
            task_id,
            TaskStatus::Completed,
            "UPDATE rescan_tasks SET status = 'completed', completed_at = ?2, result_ref = ?3 WHERE id = ?1 AND status = 'dispatched'",
            rusqlite::params![task_id, fmt_ts(Utc::now()), result_ref],
        )
    }

    async fn mark_failed(&self, task_id: &str, reason: &str) -> Result<ScanTask, ScopeError> {
        self.transition(
            task_id,
            TaskStatus::Failed,
            "UPDATE rescan_tasks SET status = 'failed', completed_at = ?2, failure_reason = ?3 WHERE id = ?1 AND status = 'dispatched'",
            rusqlite::params![task_id, fmt_ts(Utc::now()), reason],
        )
    }

    async fn list_active_tasks(&self) -> Result<Vec<ScanTask>, ScopeError> {
        self.query_tasks(
            &format!(
                "SELECT {} FROM rescan_tasks WHERE status IN ('pending', 'dispatched') ORDER BY queue_seq ASC",
                TASK_COLUMNS
            ),
            rusqlite::params![],
        )
    }

    async fn get_task(&self, task_id: &str) -> Result<Option<ScanTask>, ScopeError> {
        let tasks = self.query_tasks(
            &format!("SELECT {} FROM rescan_tasks WHERE id = ?1", TASK_COLUMNS),
            rusqlite::params![task_id],
        )?;
        Ok(tasks.into_iter().next())
    }

    async fn list_tasks_for_target(
        &self,
        target: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ScanTask>, ScopeError> {
        self.query_tasks(
            &format!(
                "SELECT {} FROM rescan_tasks WHERE target = ?1 ORDER BY created_at DESC, queue_seq DESC LIMIT ?2 OFFSET ?3",
                TASK_COLUMNS
            ),
            rusqlite::params![target, sql_int(limit), sql_int(offset)],
        )
    }
}
