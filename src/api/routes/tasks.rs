use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::api::models::PageParams;
use crate::errors::ScopeError;
use crate::models::{Pagination, ScanTask};

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<ScanTask>, ScopeError> {
    state.manager.get_task(&task_id).await?
        .map(Json)
        .ok_or_else(|| ScopeError::NotFound(format!("Task {} not found", task_id)))
}

pub async fn host_tasks(
    State(state): State<AppState>,
    Path(host): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ScopeError> {
    let pagination = Pagination::new(params.page, state.results_per_page);
    let tasks = state.manager
        .task_history(&host, pagination.per_page, pagination.offset())
        .await?;

    Ok(Json(json!({
        "target": host,
        "page": pagination.page,
        "tasks": tasks,
    })))
}
