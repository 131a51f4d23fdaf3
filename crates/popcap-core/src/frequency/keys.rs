//! Counter store key layout. These names are shared with already deployed
//! counters and must not change.

use crate::domain::{ScopeKey, VisitorId};

/// Prefix of the session and daily counters.
pub const COUNTER_PREFIX: &str = "freq_cap";
/// Prefix of the cooldown marker.
pub const COOLDOWN_PREFIX: &str = "cooldown";

/// The three keys that make up the counter record of a visitor and scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterKeys {
    pub session: String,
    pub day: String,
    pub cooldown: String,
}

impl CounterKeys {
    pub fn new(visitor: &VisitorId, scope: &ScopeKey) -> Self {
        Self {
            session: format!("{COUNTER_PREFIX}:{visitor}:{scope}:session"),
            day: format!("{COUNTER_PREFIX}:{visitor}:{scope}:day"),
            cooldown: format!("{COOLDOWN_PREFIX}:{visitor}:{scope}"),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        vec![self.session, self.day, self.cooldown]
    }
}

/// Glob patterns matching every key of a visitor, across all scopes.
pub(crate) fn visitor_patterns(visitor: &VisitorId) -> [String; 2] {
    let visitor = escape_glob(visitor.as_str());
    [
        format!("{COUNTER_PREFIX}:{visitor}:*"),
        format!("{COOLDOWN_PREFIX}:{visitor}:*"),
    ]
}

fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
