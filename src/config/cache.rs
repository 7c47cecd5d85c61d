use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Cache-aside configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Bound on a single store call (read or merge).
    /// TOML: `cache.store_timeout_ms`. Default: `10000`.
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Allow at most one fetch-and-merge in flight per timestamp. Concurrent
    /// misses for the same timestamp wait for it and re-read instead.
    /// TOML: `cache.single_flight`. Default: `false`.
    #[serde(default)]
    pub single_flight: bool,

    /// Rows returned by `/reports/recent`.
    /// TOML: `cache.recent_reports_limit`. Default: `10`.
    #[serde(default = "default_recent_reports_limit")]
    pub recent_reports_limit: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: default_store_timeout_ms(),
            single_flight: false,
            recent_reports_limit: default_recent_reports_limit(),
        }
    }
}

impl CacheConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn default_store_timeout_ms() -> u64 {
    10_000
}

fn default_recent_reports_limit() -> u32 {
    10
}
