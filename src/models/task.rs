use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ScopeError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Dispatched,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Dispatched => "dispatched",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Pending and Dispatched tasks count toward the one-active-task-per-target rule.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Dispatched)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Dispatched)
                | (Self::Dispatched, Self::Pending)
                | (Self::Dispatched, Self::Completed)
                | (Self::Dispatched, Self::Failed)
        )
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = ScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "dispatched" => Ok(Self::Dispatched),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(ScopeError::Database(format!("Unknown task status: {}", other))),
        }
    }
}

/// A unit of requested rescan work against one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanTask {
    pub id: String,
    pub target: String,
    pub requester_id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    /// When the task last entered Pending. Reset when a stale dispatch is recovered.
    pub queued_at: DateTime<Utc>,
    /// FIFO position among pending tasks; lower is served first.
    pub queue_seq: i64,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub result_ref: Option<String>,
    pub failure_reason: Option<String>,
}

impl ScanTask {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// A dispatched task is stale once `timeout` has elapsed since dispatch.
    pub fn is_stale(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        if self.status != TaskStatus::Dispatched {
            return false;
        }
        match (self.dispatched_at, chrono::Duration::from_std(timeout)) {
            (Some(dispatched_at), Ok(timeout)) => now - dispatched_at >= timeout,
            _ => false,
        }
    }
}

/// Result of a rescan request. Only `Created` and `Refreshed` mutate state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum RescanOutcome {
    Created(ScanTask),
    AlreadyPending,
    AlreadyDispatched,
    /// A stale dispatch was recovered and re-queued.
    Refreshed(ScanTask),
    Rejected(String),
}

impl RescanOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::AlreadyPending => "already_pending",
            Self::AlreadyDispatched => "already_dispatched",
            Self::Refreshed(_) => "refreshed",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// What a worker reports when a scan finishes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskOutcome {
    Completed { result_ref: String },
    Failed { reason: String },
}
