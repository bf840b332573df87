//! Content classification for inbound clipboard events.
//!
//! Normalizes a webhook payload into a record ready for insertion.
//! Classification never fails: ambiguous input yields a best-effort record.

use chrono::{DateTime, SubsecRound, Utc};
use tracing::debug;

use crate::domain::{parse_timestamp, ClipValue, NewRecord, WebhookPayload};

use super::preview;

/// Classify a payload, falling back to the current time for bad timestamps
pub fn classify(payload: WebhookPayload) -> NewRecord {
    classify_at(payload, Utc::now())
}

/// Classify a payload with an explicit ingestion time
pub fn classify_at(payload: WebhookPayload, ingested_at: DateTime<Utc>) -> NewRecord {
    let timestamp = resolve_timestamp(payload.timestamp.as_deref(), ingested_at);

    let mut is_image = payload.kind == "image";
    let mut preview_text = String::new();

    if let ClipValue::Text(text) = &payload.value {
        let preview = preview::extract(text, &payload.kind);
        is_image = is_image || preview.is_image;
        preview_text = preview.text;
    }

    NewRecord {
        kind: payload.kind,
        value: payload.value,
        subtype: payload.subtype.filter(|s| !s.is_empty()),
        timestamp,
        is_image,
        preview: preview_text,
    }
}

/// Fractional-second digits kept on record timestamps (microseconds)
pub const TIMESTAMP_PRECISION: u16 = 6;

/// Parse the caller's timestamp, substituting `ingested_at` when it is
/// missing or malformed.
///
/// The result is truncated to [`TIMESTAMP_PRECISION`] so that a record
/// handed back by ingest equals the one later read from storage.
pub fn resolve_timestamp(raw: Option<&str>, ingested_at: DateTime<Utc>) -> DateTime<Utc> {
    let resolved = match raw.map(parse_timestamp) {
        None => ingested_at,
        Some(Ok(ts)) => ts,
        Some(Err(e)) => {
            debug!(error = %e, "Using ingestion time for clipboard event");
            ingested_at
        }
    };

    resolved.trunc_subsecs(TIMESTAMP_PRECISION)
}
