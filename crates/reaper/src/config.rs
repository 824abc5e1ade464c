// SPDX-License-Identifier: MIT

//! Environment-driven configuration (SPEC_FULL §6.A).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_host: String,
    pub redis_password: String,
    pub namespace: String,
    pub idle_timeout: Duration,
    pub reaper_period: Duration,
    /// Orphan-sweep threshold is `2 × LONG_POLL_BOUND` (SPEC_FULL §4.E
    /// REDESIGN). The gateway's long-poll bound is the ground truth for
    /// this value; the reaper reads the same env var so the two binaries
    /// can never disagree about it without a matching env change.
    pub long_poll_bound: Duration,
}

impl Config {
    pub fn load() -> Self {
        Self {
            redis_host: env_or("SESSIOND_REDIS_HOST", "redis-master"),
            redis_password: env_or("SESSIOND_REDIS_PASSWORD", "admin"),
            namespace: env_or("SESSIOND_NAMESPACE", "default"),
            idle_timeout: Duration::from_secs(env_parsed("SESSIOND_IDLE_TIMEOUT_SECS", 600)),
            reaper_period: Duration::from_secs(env_parsed("SESSIOND_REAPER_PERIOD_SECS", 60)),
            long_poll_bound: Duration::from_secs(env_parsed("SESSIOND_LONG_POLL_SECS", 90)),
        }
    }

    /// `2 × LONG_POLL_BOUND` (SPEC_FULL §4.E REDESIGN): an `initiating`
    /// record with no `last_active` older than this is an orphan.
    pub fn orphan_threshold(&self) -> Duration {
        self.long_poll_bound * 2
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
