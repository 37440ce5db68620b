use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::errors::ScopeError;
use crate::models::{HostResult, HostScreenshots, ScreenshotRef};

/// Which view of the results a search runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchIndex {
    /// Newest result per host.
    #[default]
    Latest,
    /// Every result ever indexed.
    History,
}

/// Read/write access to indexed scan results.
///
/// Paginated reads return the total number of matches alongside the page.
/// Nothing matching is `(0, vec![])`, never an error.
#[async_trait]
pub trait ResultIndex: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        offset: usize,
        index: SearchIndex,
    ) -> Result<(u64, Vec<HostResult>), ScopeError>;

    async fn get_by_scan_id(&self, scan_id: &str) -> Result<Option<HostResult>, ScopeError>;

    /// Newest result for a host.
    async fn get_latest(&self, ip: &str) -> Result<Option<HostResult>, ScopeError>;

    /// All results for a host, newest first.
    async fn get_history(
        &self,
        ip: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, Vec<HostResult>), ScopeError>;

    /// All screenshots for a host, newest first.
    async fn get_screenshots(
        &self,
        ip: &str,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, Vec<ScreenshotRef>), ScopeError>;

    /// Screenshots from each host's newest result, paged by host. Returns
    /// `(hosts with screenshots, screenshots across those hosts, page)`.
    async fn get_current_screenshots(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<(u64, u64, Vec<HostScreenshots>), ScopeError>;

    /// Number of distinct hosts in the index.
    async fn total_hosts(&self) -> Result<u64, ScopeError>;

    async fn random_host(&self) -> Result<Option<HostResult>, ScopeError>;

    /// Write path for the scan engine. Results are immutable: re-indexing an
    /// existing scan id fails with `Conflict`.
    async fn index_result(&self, result: &HostResult) -> Result<(), ScopeError>;
}
