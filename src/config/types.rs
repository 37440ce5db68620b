use std::time::Duration;
use serde::{Deserialize, Serialize};

pub const DEFAULT_DISPATCH_TIMEOUT_SECS: u64 = 1200;
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_RESULTS_PER_PAGE: usize = 20;
pub const DEFAULT_DATABASE_PATH: &str = "./data/scanscope.db";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScanscopeConfig {
    pub scope: Option<ScopeConfig>,
    pub dispatch: Option<DispatchConfig>,
    pub results: Option<ResultsConfig>,
    pub database: Option<DatabaseConfig>,
}

/// Allow and deny lists. Entries are CIDR networks, single addresses,
/// hostnames, or `*.`-prefixed hostname wildcards.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ScopeConfig {
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub deny: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DispatchConfig {
    pub timeout_secs: Option<u64>,
    pub sweep_interval_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ResultsConfig {
    pub per_page: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    pub path: Option<String>,
}

impl ScanscopeConfig {
    pub fn dispatch_timeout(&self) -> Duration {
        let secs = self.dispatch.as_ref()
            .and_then(|d| d.timeout_secs)
            .unwrap_or(DEFAULT_DISPATCH_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        let secs = self.dispatch.as_ref()
            .and_then(|d| d.sweep_interval_secs)
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_SECS);
        Duration::from_secs(secs)
    }

    pub fn results_per_page(&self) -> usize {
        self.results.as_ref()
            .and_then(|r| r.per_page)
            .unwrap_or(DEFAULT_RESULTS_PER_PAGE)
    }

    pub fn database_path(&self) -> &str {
        self.database.as_ref()
            .and_then(|d| d.path.as_deref())
            .unwrap_or(DEFAULT_DATABASE_PATH)
    }

    pub fn allow_rules(&self) -> &[String] {
        self.scope.as_ref().map(|s| s.allow.as_slice()).unwrap_or(&[])
    }

    pub fn deny_rules(&self) -> &[String] {
        self.scope.as_ref().map(|s| s.deny.as_slice()).unwrap_or(&[])
    }
}
