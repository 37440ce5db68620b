use std::time::Duration;

use crate::cli::commands::StatusArgs;
use crate::errors::{with_retry, RetryConfig, ScopeError};
use crate::manager::ScopeStatus;
use crate::models::ScanTask;
use tracing::debug;

async fn fetch_status(client: &reqwest::Client, url: &str) -> Result<ScopeStatus, ScopeError> {
    let resp = client.get(url).send().await
        .map_err(|e| ScopeError::Network(format!("Failed to reach server: {}", e)))?;

    if resp.status() == reqwest::StatusCode::SERVICE_UNAVAILABLE {
        return Err(ScopeError::StoreUnavailable("Server reported its task store unavailable".into()));
    }
    if !resp.status().is_success() {
        return Err(ScopeError::Network(format!("Server returned {}", resp.status())));
    }

    resp.json().await
        .map_err(|e| ScopeError::Network(format!("Invalid response: {}", e)))
}

fn print_task(task: &ScanTask) {
    let since = task.dispatched_at.unwrap_or(task.queued_at);
    println!(
        "  {}  {:<40}  {:<10}  {}  ({})",
        task.id,
        task.target,
        task.status,
        since.format("%Y-%m-%d %H:%M:%S"),
        task.requester_id
    );
}

pub async fn handle_status(args: StatusArgs) -> Result<(), ScopeError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| ScopeError::Network(format!("Failed to build HTTP client: {}", e)))?;
    let url = format!("{}/api/scope/status", args.server.trim_end_matches('/'));
    debug!(url = %url, "Querying scope status");

    loop {
        let status = with_retry("scope_status", &RetryConfig::default(), || fetch_status(&client, &url)).await?;

        if args.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else {
            println!(
                "Pending: {}  Dispatched: {}  Stale: {}  (timeout {}s)",
                status.pending, status.dispatched, status.stale, status.dispatch_timeout_secs
            );
            for task in status.pending_tasks.iter().chain(status.dispatched_tasks.iter()) {
                print_task(task);
            }
        }

        if !args.follow {
            break;
        }
        tokio::time::sleep(Duration::from_secs(args.interval.max(1))).await;
    }

    Ok(())
}
