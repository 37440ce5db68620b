use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::api::models::{PageInfo, PageParams};
use crate::errors::ScopeError;
use crate::models::{ExportFormat, HostResult, Pagination};
use crate::scope::ScopeTarget;

/// Path hosts are matched against the canonical form the index stores.
fn host_key(raw: &str) -> Result<String, ScopeError> {
    ScopeTarget::parse(raw)
        .map(|target| target.to_string())
        .map_err(|_| no_results(raw))
}

fn no_results(ip: &str) -> ScopeError {
    ScopeError::NotFound(format!("No results for host {}", ip))
}

pub async fn get_host(
    State(state): State<AppState>,
    Path(host): Path<String>,
) -> Result<Json<Value>, ScopeError> {
    let host = host_key(&host)?;
    let latest = state.index.get_latest(&host).await?.ok_or_else(|| no_results(&host))?;
    let (history_count, _) = state.index.get_history(&host, 1, 0).await?;
    let (screenshot_count, _) = state.index.get_screenshots(&host, 1, 0).await?;

    Ok(Json(json!({
        "host": latest,
        "history_count": history_count,
        "screenshot_count": screenshot_count,
    })))
}

pub async fn host_history(
    State(state): State<AppState>,
    Path(host): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ScopeError> {
    let host = host_key(&host)?;
    let pagination = Pagination::new(params.page, state.results_per_page);
    let (count, results) = state.index
        .get_history(&host, pagination.per_page, pagination.offset())
        .await?;
    if count == 0 {
        return Err(no_results(&host));
    }

    Ok(Json(json!({
        "ip": host,
        "paging": PageInfo::new(pagination, count),
        "results": results,
    })))
}

pub async fn host_screenshots(
    State(state): State<AppState>,
    Path(host): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ScopeError> {
    let host = host_key(&host)?;
    let pagination = Pagination::new(params.page, state.results_per_page);
    let (count, screenshots) = state.index
        .get_screenshots(&host, pagination.per_page, pagination.offset())
        .await?;

    Ok(Json(json!({
        "ip": host,
        "paging": PageInfo::new(pagination, count),
        "screenshots": screenshots,
    })))
}

async fn scan_for_host(state: &AppState, host: &str, scan_id: &str) -> Result<HostResult, ScopeError> {
    let host = host_key(host)?;
    match state.index.get_by_scan_id(scan_id).await? {
        Some(result) if result.ip == host => Ok(result),
        _ => Err(ScopeError::NotFound(format!("Scan {} not found for host {}", scan_id, host))),
    }
}

pub async fn get_scan(
    State(state): State<AppState>,
    Path((host, scan_id)): Path<(String, String)>,
) -> Result<Json<HostResult>, ScopeError> {
    Ok(Json(scan_for_host(&state, &host, &scan_id).await?))
}

pub async fn export_scan(
    State(state): State<AppState>,
    Path((host, scan_id, ext)): Path<(String, String, String)>,
) -> Result<Response, ScopeError> {
    let format = ExportFormat::from_extension(&ext)
        .ok_or_else(|| ScopeError::NotFound(format!("Unknown export format '{}'", ext)))?;
    let result = scan_for_host(&state, &host, &scan_id).await?;
    let body = result.export(format)
        .ok_or_else(|| ScopeError::NotFound(format!("Scan {} has no {} output", scan_id, ext)))?;

    Ok(([(header::CONTENT_TYPE, format.mime_type())], body).into_response())
}
