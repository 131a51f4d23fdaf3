//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Campaign fields the popup-serving route forwards for a check.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_id: Option<String>,
    /// Stored targeting configuration, passed through untouched.
    #[serde(default)]
    pub targeting: Value,
}

/// Visitor identity plus ignorable request metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorPayload {
    #[serde(default)]
    pub visitor_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

/// Explicit frequency settings, used to override what a campaign stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
}

/// POST /api/frequency/check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckFrequencyRequest {
    pub campaign: CampaignPayload,
    pub visitor: VisitorPayload,
}

/// POST /api/frequency/record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordDisplayRequest {
    /// Experiment id or campaign id the display counts against.
    pub scope_key: String,
    pub visitor: VisitorPayload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicyPayload>,
}

/// POST /api/frequency/campaigns/record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordCampaignDisplayRequest {
    pub campaign: CampaignPayload,
    pub visitor: VisitorPayload,
}

/// Query of DELETE /api/frequency/visitors/{visitorId}
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetQuery {
    #[serde(default)]
    pub scope_key: Option<String>,
}

/// Response of a counter reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetResponse {
    pub removed: u64,
}

/// Current display counts of a visitor under one scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyStatusResponse {
    pub visitor_id: String,
    pub scope_key: String,
    pub session: u64,
    pub day: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_request_from_storefront_json() {
        let req: CheckFrequencyRequest = serde_json::from_str(
            r#"{
                "campaign": {"id": "c1", "experimentId": "e1", "targeting": {"max_triggers_per_session": 2}},
                "visitor": {"visitorId": "v1", "sessionId": "s1", "device": "desktop", "pageUrl": "/cart"}
            }"#,
        )
        .unwrap();

        assert_eq!(req.campaign.experiment_id.as_deref(), Some("e1"));
        assert_eq!(req.campaign.targeting["max_triggers_per_session"], 2);
        assert_eq!(req.visitor.page_url.as_deref(), Some("/cart"));
    }

    #[test]
    fn test_missing_visitor_id_deserializes_empty() {
        let visitor: VisitorPayload = serde_json::from_str(r#"{"sessionId": "s1"}"#).unwrap();
        assert!(visitor.visitor_id.is_empty());
    }
}
