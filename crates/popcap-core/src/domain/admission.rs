use serde::{Deserialize, Serialize};

/// Why a display was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    SessionLimit,
    DailyLimit,
    Cooldown,
}

/// Display counters for one visitor and scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayCounts {
    pub session: u64,
    pub day: u64,
}

impl DisplayCounts {
    pub fn new(session: u64, day: u64) -> Self {
        Self { session, day }
    }
}

/// Outcome of an admission check.
///
/// Build it through [`AdmissionResult::allow`], [`AdmissionResult::deny`] or
/// [`AdmissionResult::fail_open`] so that `reason` is set exactly when
/// `allowed` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResult {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenyReason>,
    pub current_counts: DisplayCounts,
    /// Set when the counter store failed and the check admitted anyway.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl AdmissionResult {
    pub fn allow(counts: DisplayCounts) -> Self {
        Self {
            allowed: true,
            reason: None,
            current_counts: counts,
            degraded: false,
        }
    }

    pub fn deny(reason: DenyReason, counts: DisplayCounts) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            current_counts: counts,
            degraded: false,
        }
    }

    pub fn fail_open(counts: DisplayCounts) -> Self {
        Self {
            degraded: true,
            ..Self::allow(counts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let denied = AdmissionResult::deny(DenyReason::SessionLimit, DisplayCounts::new(2, 2));
        let json = serde_json::to_value(&denied).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "allowed": false,
                "reason": "SESSION_LIMIT",
                "currentCounts": {"session": 2, "day": 2}
            })
        );

        let degraded = serde_json::to_value(AdmissionResult::fail_open(DisplayCounts::default()))
            .unwrap();
        assert_eq!(degraded["allowed"], true);
        assert_eq!(degraded["degraded"], true);
        assert!(degraded.get("reason").is_none());
    }
}
