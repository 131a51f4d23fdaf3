use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

const KEY_SEPARATOR: char = ':';

/// Durable visitor identity, opaque to the engine. Never empty and never
/// contains `:`, the counter key separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VisitorId(String);

impl VisitorId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::MissingField("visitorId"));
        }
        // "a" would otherwise prefix-match the keys of visitor "a:b" on reset
        if id.contains(KEY_SEPARATOR) {
            return Err(DomainError::Validation(format!(
                "visitorId must not contain '{KEY_SEPARATOR}'"
            )));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VisitorId {
    type Error = DomainError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<VisitorId> for String {
    fn from(id: VisitorId) -> Self {
        id.0
    }
}

impl fmt::Display for VisitorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who is asking to see a popup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorContext {
    pub visitor_id: VisitorId,
    #[serde(default)]
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
}

impl VisitorContext {
    pub fn new(visitor_id: impl Into<String>, session_id: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            visitor_id: VisitorId::new(visitor_id)?,
            session_id: session_id.into(),
            device: None,
            page_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_visitor_id_rejected() {
        assert_eq!(
            VisitorId::new("  "),
            Err(DomainError::MissingField("visitorId"))
        );
        assert!(VisitorContext::new("", "s1").is_err());
    }

    #[test]
    fn test_key_separator_rejected() {
        assert_eq!(
            VisitorId::new("a:b"),
            Err(DomainError::Validation(
                "visitorId must not contain ':'".to_string()
            ))
        );
        assert!(VisitorId::new("a-b.c_d").is_ok());

        let err = serde_json::from_str::<VisitorContext>(r#"{"visitorId":"a:b","sessionId":"s1"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_deserialize_validates_visitor_id() {
        let ok: VisitorContext =
            serde_json::from_str(r#"{"visitorId":"v1","sessionId":"s1","device":"mobile"}"#)
                .unwrap();
        assert_eq!(ok.visitor_id.as_str(), "v1");
        assert_eq!(ok.device.as_deref(), Some("mobile"));

        let err = serde_json::from_str::<VisitorContext>(r#"{"visitorId":"","sessionId":"s1"}"#);
        assert!(err.is_err());
    }
}
