use serde::{Deserialize, Serialize};

use crate::errors::ScopeError;
use crate::models::{Pagination, TaskOutcome};

#[derive(Deserialize)]
pub struct RescanRequest {
    pub requester_id: String,
}

/// Worker report body. `result_ref` is required for `completed`.
#[derive(Deserialize)]
pub struct ReportRequest {
    pub status: String,
    pub result_ref: Option<String>,
    pub reason: Option<String>,
}

impl ReportRequest {
    pub fn into_outcome(self) -> Result<TaskOutcome, ScopeError> {
        match self.status.as_str() {
            "completed" => match self.result_ref {
                Some(result_ref) if !result_ref.trim().is_empty() => Ok(TaskOutcome::Completed { result_ref }),
                _ => Err(ScopeError::Validation("result_ref is required for a completed report".into())),
            },
            "failed" => Ok(TaskOutcome::Failed {
                reason: self.reason.unwrap_or_else(|| "no reason given".to_string()),
            }),
            other => Err(ScopeError::Validation(format!(
                "Unknown report status '{}', expected 'completed' or 'failed'", other
            ))),
        }
    }
}

#[derive(Deserialize, Default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub page: Option<usize>,
    pub history: Option<bool>,
    pub format: Option<String>,
    pub include_scan_ids: Option<bool>,
}

#[derive(Deserialize, Default)]
pub struct PageParams {
    pub page: Option<usize>,
}

/// Paging block attached to every paginated response.
#[derive(Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub per_page: usize,
    pub total: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        Self {
            page: pagination.page,
            per_page: pagination.per_page,
            total,
            has_next: pagination.has_next(total),
            has_prev: pagination.has_prev(),
        }
    }
}
