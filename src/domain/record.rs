//! Clipboard records as persisted and served.
//!
//! A record is created once at ingestion and never mutated in storage.
//! Deletion is the only other state transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned record identifier (UUID v4, hyphenated)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

/// Rejected record identifier
#[derive(Debug, Clone, Error)]
#[error("Invalid record ID: {0}")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Parse a caller-supplied identifier
    pub fn parse(raw: &str) -> Result<Self, InvalidRecordId> {
        Uuid::parse_str(raw.trim())
            .map(|uuid| Self(uuid.to_string()))
            .map_err(|_| InvalidRecordId(raw.to_string()))
    }

    /// Wrap an identifier read back from a store
    pub(crate) fn from_stored(raw: String) -> Self {
        Self(raw)
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Clipboard content as supplied by the caller.
///
/// Only the `Text` variant takes part in classification. Everything else
/// is stored and served back exactly as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum ClipValue {
    /// Plain string content (text, HTML, URLs, data URIs)
    Text(String),

    /// Arrays and objects (e.g. a list of copied file paths)
    Structured(Value),

    /// Numbers, booleans and null
    Other(Value),
}

impl ClipValue {
    /// Borrow the string content, if this is a string value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClipValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Value> for ClipValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => ClipValue::Text(text),
            Value::Array(_) | Value::Object(_) => ClipValue::Structured(value),
            other => ClipValue::Other(other),
        }
    }
}

impl From<ClipValue> for Value {
    fn from(value: ClipValue) -> Self {
        match value {
            ClipValue::Text(text) => Value::String(text),
            ClipValue::Structured(value) | ClipValue::Other(value) => value,
        }
    }
}

impl From<&str> for ClipValue {
    fn from(text: &str) -> Self {
        ClipValue::Text(text.to_string())
    }
}

impl From<String> for ClipValue {
    fn from(text: String) -> Self {
        ClipValue::Text(text)
    }
}

/// A classified record that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// Content kind tag (`text`, `html`, `image`, or caller-defined)
    pub kind: String,

    /// Raw content
    pub value: ClipValue,

    /// Optional refinement of `kind`, never inspected
    pub subtype: Option<String>,

    /// When the clipboard event happened
    pub timestamp: DateTime<Utc>,

    /// Whether the content is visually an image
    pub is_image: bool,

    /// Short display string, empty when not applicable
    pub preview: String,
}

impl NewRecord {
    /// Attach the identifier assigned by the store
    pub fn with_id(self, id: RecordId) -> ClipboardRecord {
        ClipboardRecord {
            id,
            kind: self.kind,
            value: self.value,
            subtype: self.subtype,
            timestamp: self.timestamp,
            is_image: self.is_image,
            preview: self.preview,
        }
    }
}

/// A stored clipboard record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardRecord {
    pub id: RecordId,

    #[serde(rename = "type")]
    pub kind: String,

    pub value: ClipValue,

    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    pub is_image: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub preview: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_id_parse() {
        let id = RecordId::generate();
        let parsed = RecordId::parse(id.as_str()).unwrap();
        assert_eq!(id, parsed);

        assert!(RecordId::parse("not-an-id").is_err());
        assert!(RecordId::parse("").is_err());
    }

    #[test]
    fn test_clip_value_variants() {
        assert_eq!(
            ClipValue::from(json!("hello")),
            ClipValue::Text("hello".to_string())
        );
        assert!(matches!(
            ClipValue::from(json!(["/tmp/a.txt", "/tmp/b.txt"])),
            ClipValue::Structured(_)
        ));
        assert!(matches!(ClipValue::from(json!({"a": 1})), ClipValue::Structured(_)));
        assert!(matches!(ClipValue::from(json!(42)), ClipValue::Other(_)));
        assert!(matches!(ClipValue::from(Value::Null), ClipValue::Other(_)));
    }

    #[test]
    fn test_record_wire_format() {
        let record = NewRecord {
            kind: "text".to_string(),
            value: ClipValue::from("hello"),
            subtype: None,
            timestamp: Utc::now(),
            is_image: false,
            preview: String::new(),
        }
        .with_id(RecordId::generate());

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["value"], "hello");
        assert_eq!(json["isImage"], false);
        assert!(json.get("subtype").is_none());
        assert!(json.get("preview").is_none());

        let parsed: ClipboardRecord = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record);
    }
}
