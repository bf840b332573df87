//! ecopaste - Clipboard history service
//!
//! Receives clipboard events over a webhook, classifies them (image or
//! text, with a short preview), stores them, and serves a paginated,
//! filterable history.
//!
//! # Architecture
//!
//! - Classification and query planning are pure functions over domain types
//! - Storage sits behind the `ClipboardStore` trait (SQLite or in-memory)
//! - Every store call runs under a fixed deadline
//! - Records stored before image detection improved are corrected on read
//!
//! # Modules
//!
//! - `adapters`: HTTP API and outbound webhook client
//! - `core`: Classification, query planning, reconciliation, service
//! - `domain`: Data structures (WebhookPayload, ClipboardRecord, RecordId)
//! - `store`: Storage backends
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Run the service
//! ecopaste serve --bind 127.0.0.1:3000
//!
//! # Store an event locally
//! ecopaste ingest text "https://example.com/cat.png"
//!
//! # Browse history
//! ecopaste list --type image --search cat
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use core::{ClipboardService, Deadlines, PageResponse, QueryParams, ServiceError};
pub use domain::{ClipValue, ClipboardRecord, NewRecord, RecordId, WebhookPayload};
pub use store::{ClipboardStore, MemoryStore, SqliteStore, StoreError, StoreOperation};
