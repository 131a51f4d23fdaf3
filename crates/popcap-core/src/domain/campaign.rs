use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The slice of a campaign record the admission engine reads.
///
/// Campaigns are owned by the admin CRUD side; only the identifiers and the
/// free-form targeting document matter here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    /// Stored targeting configuration, shape not guaranteed.
    #[serde(default)]
    pub targeting: Value,
}

impl Campaign {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            experiment_id: None,
            targeting: Value::Null,
        }
    }

    pub fn with_experiment(mut self, experiment_id: impl Into<String>) -> Self {
        self.experiment_id = Some(experiment_id.into());
        self
    }

    pub fn with_targeting(mut self, targeting: Value) -> Self {
        self.targeting = targeting;
        self
    }

    /// The experiment this campaign is a variant of, if any.
    pub fn experiment(&self) -> Option<&str> {
        self.experiment_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Identity under which frequency counters are tracked.
///
/// Either a campaign id or, for A/B variants, the shared experiment id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopeKey(String);

impl ScopeKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ScopeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ScopeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_experiment_is_ignored() {
        let campaign = Campaign::new("c1").with_experiment("   ");
        assert_eq!(campaign.experiment(), None);

        let campaign = Campaign::new("c1").with_experiment("exp-9");
        assert_eq!(campaign.experiment(), Some("exp-9"));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let campaign: Campaign = serde_json::from_str(
            r#"{"id":"c1","experimentId":"e1","targeting":{"max_triggers_per_day":3}}"#,
        )
        .unwrap();
        assert_eq!(campaign.id, "c1");
        assert_eq!(campaign.experiment(), Some("e1"));
        assert_eq!(campaign.targeting["max_triggers_per_day"], 3);
    }
}
