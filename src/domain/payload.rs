//! Inbound webhook payloads.
//!
//! The same shape is produced by the outbound webhook client, so a
//! payload pushed by one instance can be ingested by another.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::record::ClipValue;

/// A clipboard event as posted to the webhook endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Content kind (`text`, `html`, `image`, `files`, `rtf`, ...)
    #[serde(rename = "type")]
    pub kind: String,

    /// Raw content, any JSON value
    pub value: ClipValue,

    /// RFC 3339 timestamp of the clipboard event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Optional refinement of `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
}

impl WebhookPayload {
    /// Create a payload without a timestamp
    pub fn new(kind: impl Into<String>, value: impl Into<ClipValue>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            timestamp: None,
            subtype: None,
        }
    }

    /// Create a payload stamped with the current time
    pub fn now(kind: impl Into<String>, value: impl Into<ClipValue>) -> Self {
        Self::new(kind, value)
            .with_timestamp(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// Set the timestamp
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Set the subtype
    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }
}

/// Timestamp parse failures
#[derive(Debug, Clone, Error)]
pub enum TimestampError {
    #[error("Timestamp is empty")]
    Empty,

    #[error("Invalid RFC 3339 timestamp '{input}': {source}")]
    Invalid {
        input: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Parse an RFC 3339 timestamp into UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, TimestampError> {
    if raw.is_empty() {
        return Err(TimestampError::Empty);
    }

    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| TimestampError::Invalid {
            input: raw.to_string(),
            source,
        })
}
