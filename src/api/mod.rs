pub mod routes;
pub mod models;
pub mod errors;

use std::sync::Arc;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use crate::config::ScanscopeConfig;
use crate::db::Database;
use crate::errors::ScopeError;
use crate::manager::ScopeManager;
use crate::scope::TargetValidator;
use crate::store::ResultIndex;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ScopeManager>,
    pub index: Arc<dyn ResultIndex>,
    pub results_per_page: usize,
}

/// Wire the scope manager and result index to one database. The manager's
/// cache starts empty; the caller refreshes it before serving.
pub fn create_app_state(config: &ScanscopeConfig, db: Database) -> Result<AppState, ScopeError> {
    let validator = TargetValidator::from_config(config)?;
    let manager = ScopeManager::new(Arc::new(db.clone()), validator, config.dispatch_timeout());
    Ok(AppState {
        manager: Arc::new(manager),
        index: Arc::new(db),
        results_per_page: config.results_per_page(),
    })
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/scope/status", get(routes::rescan::scope_status))
        .route("/api/work/claim", post(routes::work::claim))
        .route("/api/work/:task_id", get(routes::tasks::get_task))
        .route("/api/work/:task_id/report", post(routes::work::report))
        .route("/api/results", post(routes::results::index_result))
        .route("/api/search", get(routes::results::search))
        .route("/api/random", get(routes::results::random_host))
        .route("/api/screenshots", get(routes::results::browse_screenshots))
        .route("/api/hosts/:host", get(routes::hosts::get_host))
        .route("/api/hosts/:host/rescan", post(routes::rescan::request_rescan))
        .route("/api/hosts/:host/tasks", get(routes::tasks::host_tasks))
        .route("/api/hosts/:host/history", get(routes::hosts::host_history))
        .route("/api/hosts/:host/screenshots", get(routes::hosts::host_screenshots))
        .route("/api/hosts/:host/scans/:scan_id", get(routes::hosts::get_scan))
        .route("/api/hosts/:host/scans/:scan_id/export/:ext", get(routes::hosts::export_scan))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
