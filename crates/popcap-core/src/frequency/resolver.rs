//! Extracts frequency rules and the counter scope from a campaign record.

use serde_json::Value;

use crate::domain::{Campaign, FrequencyPolicy, ScopeKey};

const SESSION_FIELD: &str = "max_triggers_per_session";
const DAILY_FIELD: &str = "max_triggers_per_day";
const COOLDOWN_FIELD: &str = "cooldown_between_triggers";

/// Read the frequency policy out of the campaign's targeting document.
///
/// Never fails: missing, negative or non-numeric fields are treated as absent.
pub fn resolve_policy(campaign: &Campaign) -> FrequencyPolicy {
    let targeting = &campaign.targeting;
    if !targeting.is_object() && !targeting.is_null() {
        tracing::warn!(
            campaign_id = %campaign.id,
            "Targeting configuration is not an object, no frequency capping applied"
        );
        return FrequencyPolicy::default();
    }

    FrequencyPolicy {
        session_limit: read_field(campaign, SESSION_FIELD).and_then(|n| u32::try_from(n).ok()),
        daily_limit: read_field(campaign, DAILY_FIELD).and_then(|n| u32::try_from(n).ok()),
        cooldown_seconds: read_field(campaign, COOLDOWN_FIELD),
    }
}

/// Experiment id when the campaign is an A/B variant, otherwise the campaign id.
///
/// Variants of one experiment must share counters, or a visitor capped on
/// variant A could immediately be shown variant B.
pub fn resolve_scope_key(campaign: &Campaign) -> ScopeKey {
    match campaign.experiment() {
        Some(experiment) => ScopeKey::new(experiment),
        None => ScopeKey::new(campaign.id.as_str()),
    }
}

fn read_field(campaign: &Campaign, field: &str) -> Option<u64> {
    let raw = campaign.targeting.get(field)?;
    let parsed = parse_count(raw);
    if parsed.is_none() && !raw.is_null() {
        tracing::warn!(
            campaign_id = %campaign.id,
            field,
            value = %raw,
            "Ignoring malformed frequency setting"
        );
    }
    parsed
}

fn parse_count(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
