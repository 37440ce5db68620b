use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use crate::api::AppState;
use crate::api::models::ReportRequest;
use crate::errors::ScopeError;
use crate::models::ScanTask;

/// Hand the next pending task to a worker, or 204 when the queue is empty.
pub async fn claim(State(state): State<AppState>) -> Result<Response, ScopeError> {
    match state.manager.claim_next_pending().await? {
        Some(task) => Ok((StatusCode::OK, Json(task)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub async fn report(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
    Json(req): Json<ReportRequest>,
) -> Result<Json<ScanTask>, ScopeError> {
    let outcome = req.into_outcome()?;
    let task = state.manager.report_completion(&task_id, outcome).await?;
    Ok(Json(task))
}
