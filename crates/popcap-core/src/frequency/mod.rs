//! Frequency capping - decides whether a popup may be displayed right now.
//!
//! The check path is read-only and safe to call speculatively; displays are
//! counted separately through [`FrequencyCapper::record`] once the popup has
//! actually rendered. Counter store failures never reach the caller: checks
//! fail open and writes are logged and dropped.

mod engine;
mod keys;
mod resolver;
mod stats;

use std::time::Duration;

pub use engine::FrequencyCapper;
pub use keys::{COOLDOWN_PREFIX, COUNTER_PREFIX, CounterKeys};
pub use resolver::{resolve_policy, resolve_scope_key};
pub use stats::StatsSnapshot;

/// Window lengths and store timeouts for the engine.
#[derive(Debug, Clone)]
pub struct FrequencyConfig {
    /// Lifetime of the session counter, counted from its first increment.
    pub session_ttl: Duration,
    /// Lifetime of the daily counter, counted from its first increment.
    pub day_ttl: Duration,
    /// Upper bound on every counter store call.
    pub store_timeout: Duration,
}

impl Default for FrequencyConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(30 * 60),
            day_ttl: Duration::from_secs(24 * 60 * 60),
            store_timeout: Duration::from_millis(250),
        }
    }
}

impl FrequencyConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            session_ttl: std::env::var("FREQ_SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            day_ttl: std::env::var("FREQ_DAY_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.day_ttl),
            store_timeout: std::env::var("FREQ_STORE_TIMEOUT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
        }
    }
}
