//! Domain types for the clipboard history service.
//!
//! This module contains the core data structures:
//! - Record: A classified clipboard event as stored and served
//! - Payload: The inbound webhook shape and timestamp parsing

pub mod payload;
pub mod record;

// Re-export commonly used types
pub use payload::{parse_timestamp, TimestampError, WebhookPayload};
pub use record::{ClipValue, ClipboardRecord, InvalidRecordId, NewRecord, RecordId};
