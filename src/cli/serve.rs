use std::path::PathBuf;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api;
use crate::cli::commands::ServeArgs;
use crate::config::{parse_config, ScanscopeConfig};
use crate::db::Database;
use crate::errors::{with_retry, RetryConfig, ScopeError};

pub async fn handle_serve(args: ServeArgs) -> Result<(), ScopeError> {
    let config = match &args.config {
        Some(path) => parse_config(&PathBuf::from(path)).await?,
        None => {
            warn!("No config file given, every target will be rejected");
            ScanscopeConfig::default()
        }
    };
    let db_path = args.db.clone().unwrap_or_else(|| config.database_path().to_string());
    info!(
        host = %args.host,
        port = args.port,
        db = %db_path,
        dispatch_timeout_secs = config.dispatch_timeout().as_secs(),
        "Starting API server"
    );

    let db = Database::new(&db_path)?;
    let state = api::create_app_state(&config, db)?;

    // The cache must reflect tasks left over from a previous run before any
    // request is decided against it.
    let manager = state.manager.clone();
    with_retry("load_active_tasks", &RetryConfig::default(), || manager.refresh()).await?;
    let status = manager.status().await;
    info!(pending = status.pending, dispatched = status.dispatched, "Loaded active tasks");

    let cancel = CancellationToken::new();
    let sweeper = manager.spawn_sweeper(config.sweep_interval(), cancel.clone());

    let app = api::build_router(state);
    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let shutdown = cancel.clone();
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => info!("Shutdown requested"),
                _ = shutdown.cancelled() => {}
            }
        })
        .await
        .map_err(|e| ScopeError::Internal(format!("Server error: {}", e)));

    cancel.cancel();
    if let Err(e) = sweeper.await {
        warn!(error = %e, "Sweeper task ended abnormally");
    }
    served
}
