use std::collections::{BTreeMap, HashMap};

use crate::models::{ScanTask, TaskStatus};

/// In-memory view of active tasks. Derived from the task store and rebuilt
/// wholesale when it may have diverged.
#[derive(Debug, Default)]
pub(crate) struct ScopeCache {
    pending_by_target: HashMap<String, ScanTask>,
    /// queue_seq -> target, so the front of the queue is the first entry.
    pending_order: BTreeMap<i64, String>,
    dispatched_by_target: HashMap<String, ScanTask>,
}

impl ScopeCache {
    pub(crate) fn from_tasks(tasks: Vec<ScanTask>) -> Self {
        let mut cache = Self::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => cache.insert_pending(task),
                TaskStatus::Dispatched => cache.insert_dispatched(task),
                TaskStatus::Completed | TaskStatus::Failed => {}
            }
        }
        cache
    }

    pub(crate) fn pending(&self, target: &str) -> Option<&ScanTask> {
        self.pending_by_target.get(target)
    }

    pub(crate) fn dispatched(&self, target: &str) -> Option<&ScanTask> {
        self.dispatched_by_target.get(target)
    }

    pub(crate) fn front_pending(&self) -> Option<&ScanTask> {
        self.pending_order.values()
            .next()
            .and_then(|target| self.pending_by_target.get(target))
    }

    pub(crate) fn insert_pending(&mut self, task: ScanTask) {
        self.remove_pending(&task.target);
        self.pending_order.insert(task.queue_seq, task.target.clone());
        self.pending_by_target.insert(task.target.clone(), task);
    }

    pub(crate) fn remove_pending(&mut self, target: &str) -> Option<ScanTask> {
        let task = self.pending_by_target.remove(target)?;
        self.pending_order.remove(&task.queue_seq);
        Some(task)
    }

    pub(crate) fn insert_dispatched(&mut self, task: ScanTask) {
        self.dispatched_by_target.insert(task.target.clone(), task);
    }

    pub(crate) fn remove_dispatched(&mut self, target: &str) -> Option<ScanTask> {
        self.dispatched_by_target.remove(target)
    }

    pub(crate) fn is_dispatched_id(&self, task_id: &str) -> bool {
        self.dispatched_by_target.values().any(|t| t.id == task_id)
    }

    /// Replace the pending half with the pending tasks in `tasks`. A target
    /// has one active task, so stale dispatched entries for those targets go too.
    pub(crate) fn replace_pending(&mut self, tasks: &[ScanTask]) {
        self.pending_by_target.clear();
        self.pending_order.clear();
        for task in tasks.iter().filter(|t| t.status == TaskStatus::Pending) {
            self.dispatched_by_target.remove(&task.target);
            self.insert_pending(task.clone());
        }
    }

    /// Replace the dispatched half with the dispatched tasks in `tasks`,
    /// dropping any pending entry left behind for the same targets.
    pub(crate) fn replace_dispatched(&mut self, tasks: &[ScanTask]) {
        self.dispatched_by_target.clear();
        for task in tasks.iter().filter(|t| t.status == TaskStatus::Dispatched) {
            self.remove_pending(&task.target);
            self.insert_dispatched(task.clone());
        }
    }

    /// Pending tasks in queue order.
    pub(crate) fn pending_tasks(&self) -> Vec<ScanTask> {
        self.pending_order.values()
            .filter_map(|target| self.pending_by_target.get(target))
            .cloned()
            .collect()
    }

    /// Dispatched tasks, oldest dispatch first.
    pub(crate) fn dispatched_tasks(&self) -> Vec<ScanTask> {
        let mut tasks: Vec<ScanTask> = self.dispatched_by_target.values().cloned().collect();
        tasks.sort_by(|a, b| a.dispatched_at.cmp(&b.dispatched_at).then_with(|| a.id.cmp(&b.id)));
        tasks
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending_by_target.len()
    }

    pub(crate) fn dispatched_len(&self) -> usize {
        self.dispatched_by_target.len()
    }
}
