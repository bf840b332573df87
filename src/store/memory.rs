//! In-memory record store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::query::{FilterSpec, PageWindow, SortOrder};
use crate::domain::{ClipboardRecord, NewRecord, RecordId};

use super::{ClipboardStore, StoreError};

/// Process-local store backed by a vector
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<ClipboardRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// Get a stored record exactly as inserted
    pub async fn get(&self, id: &RecordId) -> Option<ClipboardRecord> {
        self.records.read().await.iter().find(|r| &r.id == id).cloned()
    }
}

#[async_trait]
impl ClipboardStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, record: NewRecord) -> Result<RecordId, StoreError> {
        let id = RecordId::generate();
        self.records.write().await.push(record.with_id(id.clone()));
        Ok(id)
    }

    async fn count(&self, filter: &FilterSpec) -> Result<u64, StoreError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn find(
        &self,
        filter: &FilterSpec,
        window: &PageWindow,
    ) -> Result<Vec<ClipboardRecord>, StoreError> {
        let records = self.records.read().await;
        let mut matched: Vec<&ClipboardRecord> = records.iter().filter(|r| filter.matches(r)).collect();

        match window.order {
            SortOrder::TimestampDescending => {
                matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            }
        }

        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

        Ok(matched.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn delete(&self, id: &RecordId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        match records.iter().position(|r| &r.id == id) {
            Some(pos) => {
                records.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::{plan, QueryParams};
    use crate::domain::ClipValue;
    use chrono::{Duration, Utc};

    fn record(preview: &str, is_image: bool, age_minutes: i64) -> NewRecord {
        NewRecord {
            kind: "text".to_string(),
            value: ClipValue::from(preview),
            subtype: None,
            timestamp: Utc::now() - Duration::minutes(age_minutes),
            is_image,
            preview: preview.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_delete() {
        let store = MemoryStore::new();
        let id = store.insert(record("a", false, 0)).await.unwrap();

        assert_eq!(store.len().await, 1);
        assert!(store.get(&id).await.is_some());

        assert!(store.delete(&id).await.unwrap());
        assert!(!store.delete(&id).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_newest_first_with_window() {
        let store = MemoryStore::new();
        store.insert(record("oldest", false, 30)).await.unwrap();
        store.insert(record("newest", false, 0)).await.unwrap();
        store.insert(record("middle", false, 10)).await.unwrap();

        let q = plan(&QueryParams::default());
        let all = store.find(&q.filter, &q.window).await.unwrap();
        let previews: Vec<&str> = all.iter().map(|r| r.preview.as_str()).collect();
        assert_eq!(previews, vec!["newest", "middle", "oldest"]);

        let q = plan(&QueryParams::default().with_page(2).with_page_size(2));
        let page = store.find(&q.filter, &q.window).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].preview, "oldest");
    }

    #[tokio::test]
    async fn test_count_with_filter() {
        let store = MemoryStore::new();
        store.insert(record("Hello world", false, 0)).await.unwrap();
        store.insert(record("Image", true, 1)).await.unwrap();

        let q = plan(&QueryParams::default().with_type("image"));
        assert_eq!(store.count(&q.filter).await.unwrap(), 1);

        let q = plan(&QueryParams::default().with_search("HELLO"));
        assert_eq!(store.count(&q.filter).await.unwrap(), 1);

        let q = plan(&QueryParams::default().with_type("image").with_search("hello"));
        assert_eq!(store.count(&q.filter).await.unwrap(), 0);
    }
}
