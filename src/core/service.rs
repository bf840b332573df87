//! Clipboard history service.
//!
//! Wires the classifier, query planner and reconciler to a store. Every
//! store call runs under a fixed deadline; an expired deadline fails the
//! request and is never retried here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::{ClipboardRecord, RecordId, WebhookPayload};
use crate::store::{ClipboardStore, StoreError, StoreOperation};

use super::classifier::classify;
use super::query::{plan, PageResponse, QueryParams};
use super::reconcile::reconcile;

/// Per-operation store deadlines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub insert: Duration,
    /// Shared by the count and find calls of one list request
    pub query: Duration,
    pub delete: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            insert: Duration::from_secs(5),
            query: Duration::from_secs(10),
            delete: Duration::from_secs(5),
        }
    }
}

/// Service-level failures
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Store {operation} failed: {source}")]
    Storage {
        operation: StoreOperation,
        #[source]
        source: StoreError,
    },

    #[error("Record not found: {0}")]
    NotFound(RecordId),

    #[error("Invalid record ID: {0}")]
    InvalidId(String),
}

impl ServiceError {
    /// True for failures of the backing store (as opposed to caller errors)
    pub fn is_storage(&self) -> bool {
        matches!(self, ServiceError::Storage { .. })
    }
}

/// Ingest, list and delete clipboard records
pub struct ClipboardService {
    store: Arc<dyn ClipboardStore>,
    deadlines: Deadlines,
}

impl ClipboardService {
    /// Create a service over the given store
    pub fn new(store: Arc<dyn ClipboardStore>) -> Self {
        Self::with_deadlines(store, Deadlines::default())
    }

    /// Create a service with custom deadlines
    pub fn with_deadlines(store: Arc<dyn ClipboardStore>, deadlines: Deadlines) -> Self {
        Self { store, deadlines }
    }

    /// Name of the backing store
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Classify and store an inbound clipboard event
    #[instrument(skip(self, payload), fields(kind = %payload.kind))]
    pub async fn ingest(&self, payload: WebhookPayload) -> Result<ClipboardRecord, ServiceError> {
        let record = classify(payload);

        let id = bounded(
            StoreOperation::Insert,
            self.deadlines.insert,
            self.store.insert(record.clone()),
        )
        .await?;

        info!(record_id = %id, is_image = record.is_image, "Clipboard event stored");
        Ok(record.with_id(id))
    }

    /// Read one page of history. Count and find share the query deadline.
    #[instrument(skip(self))]
    pub async fn list(&self, params: QueryParams) -> Result<PageResponse, ServiceError> {
        let plan = plan(&params);
        let budget = self.deadlines.query;
        let deadline = Instant::now() + budget;

        let total = bounded_until(
            StoreOperation::Count,
            deadline,
            budget,
            self.store.count(&plan.filter),
        )
        .await?;

        let items = bounded_until(
            StoreOperation::Find,
            deadline,
            budget,
            self.store.find(&plan.filter, &plan.window),
        )
        .await?;

        debug!(total, returned = items.len(), "Fetched clipboard page");
        Ok(plan.into_response(reconcile(items), total))
    }

    /// Delete a record by its caller-supplied id
    #[instrument(skip(self))]
    pub async fn delete(&self, raw_id: &str) -> Result<(), ServiceError> {
        let id = RecordId::parse(raw_id).map_err(|e| ServiceError::InvalidId(e.0))?;

        let removed = bounded(
            StoreOperation::Delete,
            self.deadlines.delete,
            self.store.delete(&id),
        )
        .await?;

        if !removed {
            return Err(ServiceError::NotFound(id));
        }

        info!(record_id = %id, "Clipboard record deleted");
        Ok(())
    }
}

/// Run a store call under its own deadline
async fn bounded<T, F>(operation: StoreOperation, after: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    bounded_until(operation, Instant::now() + after, after, call).await
}

/// Run a store call that must finish by `deadline`. `budget` is the
/// total allowance the deadline was derived from, used for reporting.
async fn bounded_until<T, F>(
    operation: StoreOperation,
    deadline: Instant,
    budget: Duration,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let result = match tokio::time::timeout_at(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout {
            operation,
            after: budget,
        }),
    };

    result.map_err(|source| {
        warn!(%operation, error = %source, "Store call failed");
        ServiceError::Storage { operation, source }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service() -> (ClipboardService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (ClipboardService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_ingest_assigns_id() {
        let (service, store) = service();

        let record = service
            .ingest(WebhookPayload::new("html", "<p>Hello <b>world</b></p>"))
            .await
            .unwrap();

        assert_eq!(record.preview, "Hello world");
        assert!(!record.is_image);
        assert_eq!(store.get(&record.id).await, Some(record));
    }

    #[tokio::test]
    async fn test_delete_outcomes() {
        let (service, _store) = service();
        let record = service.ingest(WebhookPayload::new("text", "a")).await.unwrap();

        service.delete(record.id.as_str()).await.unwrap();

        let again = service.delete(record.id.as_str()).await;
        assert!(matches!(again, Err(ServiceError::NotFound(_))));

        let invalid = service.delete("zzz").await;
        assert!(matches!(invalid, Err(ServiceError::InvalidId(_))));
        assert!(!invalid.unwrap_err().is_storage());
    }

    #[tokio::test]
    async fn test_list_envelope() {
        let (service, _store) = service();
        for i in 0..5 {
            service
                .ingest(WebhookPayload::new("text", format!("item {}", i)))
                .await
                .unwrap();
        }

        let page = service
            .list(QueryParams::default().with_page(2).with_page_size(2))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 5);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 2);
        assert_eq!(page.total_pages, 3);
    }
}
