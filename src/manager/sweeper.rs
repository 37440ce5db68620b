use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::scope::ScopeManager;

impl ScopeManager {
    /// Run [`sweep_stale_dispatches`](Self::sweep_stale_dispatches) every
    /// `interval` until `cancel` fires. Sweep failures are logged and the
    /// next tick tries again.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;
            info!(interval_secs = interval.as_secs(), "Stale dispatch sweeper started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        info!("Stale dispatch sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        match manager.sweep_stale_dispatches(manager.dispatch_timeout()).await {
                            Ok(requeued) if !requeued.is_empty() => {
                                info!(count = requeued.len(), "Sweep re-queued stale dispatches");
                            }
                            Ok(_) => debug!("Sweep found no stale dispatches"),
                            Err(e) => warn!(
                                error = %e,
                                retryable = e.is_retryable(),
                                "Stale dispatch sweep failed"
                            ),
                        }
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::db::Database;
    use crate::models::TaskStatus;
    use crate::scope::TargetValidator;
    use crate::store::TaskStore;

    #[tokio::test]
    async fn test_sweeper_requeues_and_stops_on_cancel() {
        let db = Database::in_memory().unwrap();
        let task = db.create_task("10.0.0.5", "user1").await.unwrap();
        db.mark_dispatched(&task.id, Utc::now() - chrono::Duration::seconds(120)).await.unwrap();

        let validator = TargetValidator::from_rules(&["10.0.0.0/8"], &[]).unwrap();
        let manager = Arc::new(ScopeManager::new(Arc::new(db.clone()), validator, Duration::from_secs(60)));
        manager.refresh().await.unwrap();

        let cancel = CancellationToken::new();
        let handle = manager.spawn_sweeper(Duration::from_millis(20), cancel.clone());

        let mut requeued = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(20)).await;
            if db.get_task(&task.id).await.unwrap().unwrap().status == TaskStatus::Pending {
                requeued = true;
                break;
            }
        }
        assert!(requeued);
        assert_eq!(manager.pending_tasks().await.len(), 1);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }
}
