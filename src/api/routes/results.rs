use std::net::IpAddr;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use crate::api::AppState;
use crate::api::models::{PageInfo, PageParams, SearchParams};
use crate::errors::ScopeError;
use crate::models::{hostlist, HostResult, Pagination};
use crate::store::SearchIndex;

/// Write path for the scan engine.
pub async fn index_result(
    State(state): State<AppState>,
    Json(mut result): Json<HostResult>,
) -> Result<(StatusCode, Json<Value>), ScopeError> {
    if result.scan_id.trim().is_empty() {
        return Err(ScopeError::Validation("scan_id must not be empty".into()));
    }
    result.ip = result.ip.trim().parse::<IpAddr>()
        .map_err(|_| ScopeError::Validation(format!("'{}' is not an IP address", result.ip)))?
        .to_canonical()
        .to_string();

    state.index.index_result(&result).await?;
    Ok((StatusCode::CREATED, Json(json!({
        "scan_id": result.scan_id,
        "ip": result.ip,
    }))))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ScopeError> {
    let query = params.query.unwrap_or_default();
    let pagination = Pagination::new(params.page, state.results_per_page);
    let index = if params.history.unwrap_or(false) {
        SearchIndex::History
    } else {
        SearchIndex::Latest
    };

    let (total, hosts) = state.index
        .search(&query, pagination.per_page, pagination.offset(), index)
        .await?;

    if params.format.as_deref() == Some("hostlist") {
        let body = hostlist(&hosts, params.include_scan_ids.unwrap_or(false));
        return Ok(([(header::CONTENT_TYPE, "text/plain")], body).into_response());
    }

    let total_hosts = state.index.total_hosts().await?;
    Ok(Json(json!({
        "query": query,
        "index": index,
        "total_hosts": total_hosts,
        "paging": PageInfo::new(pagination, total),
        "hosts": hosts,
    })).into_response())
}

pub async fn random_host(State(state): State<AppState>) -> Result<Json<HostResult>, ScopeError> {
    state.index.random_host().await?
        .map(Json)
        .ok_or_else(|| ScopeError::NotFound("No hosts have been indexed".into()))
}

/// Latest screenshots across all hosts, paged by host.
pub async fn browse_screenshots(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<Json<Value>, ScopeError> {
    let pagination = Pagination::new(params.page, state.results_per_page);
    let (total_hosts, total_screenshots, hosts) = state.index
        .get_current_screenshots(pagination.per_page, pagination.offset())
        .await?;

    Ok(Json(json!({
        "total_screenshots": total_screenshots,
        "paging": PageInfo::new(pagination, total_hosts),
        "hosts": hosts,
    })))
}
