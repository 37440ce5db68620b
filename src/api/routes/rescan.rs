use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use crate::api::AppState;
use crate::api::models::RescanRequest;
use crate::errors::ScopeError;
use crate::manager::ScopeStatus;
use crate::models::RescanOutcome;

pub async fn request_rescan(
    State(state): State<AppState>,
    Path(host): Path<String>,
    Json(req): Json<RescanRequest>,
) -> Result<(StatusCode, Json<RescanOutcome>), ScopeError> {
    if req.requester_id.trim().is_empty() {
        return Err(ScopeError::Validation("requester_id must not be empty".into()));
    }

    let outcome = state.manager.request_rescan(&host, req.requester_id.trim()).await?;
    let status = match &outcome {
        RescanOutcome::Created(_) => StatusCode::CREATED,
        RescanOutcome::Refreshed(_) => StatusCode::OK,
        RescanOutcome::AlreadyPending | RescanOutcome::AlreadyDispatched => StatusCode::CONFLICT,
        RescanOutcome::Rejected(_) => StatusCode::BAD_REQUEST,
    };
    Ok((status, Json(outcome)))
}

pub async fn scope_status(State(state): State<AppState>) -> Json<ScopeStatus> {
    Json(state.manager.status().await)
}
