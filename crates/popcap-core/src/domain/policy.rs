use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Normalized frequency rules for one campaign or experiment.
///
/// Every field is optional; zero counts as "not configured" for all three.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
}

impl FrequencyPolicy {
    pub fn with_session_limit(mut self, limit: u32) -> Self {
        self.session_limit = Some(limit);
        self
    }

    pub fn with_daily_limit(mut self, limit: u32) -> Self {
        self.daily_limit = Some(limit);
        self
    }

    pub fn with_cooldown_seconds(mut self, seconds: u64) -> Self {
        self.cooldown_seconds = Some(seconds);
        self
    }

    pub fn session_cap(&self) -> Option<u32> {
        self.session_limit.filter(|limit| *limit > 0)
    }

    pub fn daily_cap(&self) -> Option<u32> {
        self.daily_limit.filter(|limit| *limit > 0)
    }

    /// Cooldown to enforce after a display. `None` for absent or zero.
    pub fn cooldown(&self) -> Option<Duration> {
        self.cooldown_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// True when no rule is configured, so every check admits.
    pub fn is_unbounded(&self) -> bool {
        self.session_cap().is_none() && self.daily_cap().is_none() && self.cooldown().is_none()
    }
}
