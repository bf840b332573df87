//! Record storage.
//!
//! The service only needs four operations from a store: insert one record,
//! count matches, fetch a sorted window of matches, and delete by id.
//!
//! # Implementations
//!
//! - `SqliteStore`: durable single-file store (rusqlite)
//! - `MemoryStore`: process-local store for tests and throwaway servers

pub mod memory;
pub mod sqlite;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::query::{FilterSpec, PageWindow};
use crate::domain::{ClipboardRecord, NewRecord, RecordId};

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Store operations, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Insert,
    Count,
    Find,
    Delete,
}

impl std::fmt::Display for StoreOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreOperation::Insert => write!(f, "insert"),
            StoreOperation::Count => write!(f, "count"),
            StoreOperation::Find => write!(f, "find"),
            StoreOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Errors that can occur talking to a store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store {operation} timed out after {after:?}")]
    Timeout {
        operation: StoreOperation,
        after: Duration,
    },

    #[error("Store call cancelled by its caller")]
    Cancelled,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Document store holding clipboard records
#[async_trait]
pub trait ClipboardStore: Send + Sync {
    /// Human-readable store name
    fn name(&self) -> &str;

    /// Insert a record as a single document, returning its new id
    async fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError>;

    /// Count records matching the filter
    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError>;

    /// Fetch matching records, newest first, sliced by the window
    async fn find(
        &self,
        filter: &FilterSpec,
        window: &PageWindow,
    ) -> Result<Vec<ClipboardRecord>, StoreError>;

    /// Delete a record. Returns false if no record had this id.
    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError>;
}
