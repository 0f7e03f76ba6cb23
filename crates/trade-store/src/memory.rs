use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::{StoreError, StoreResult};
use crate::store::{compare_field_values, TradeStore};

/// In-memory document store.
///
/// Backs tests and store-less local runs with the same contract as the
/// REST store. `set_failing(true)` makes every call return
/// `StoreError::Unavailable`, so degraded-store paths are testable.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an unreachable store.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of documents in a collection, for test assertions.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .expect("memory store lock poisoned")
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn check_reachable(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TradeStore for MemoryStore {
    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool> {
        self.check_reachable()?;
        Ok(self
            .collections
            .read()
            .expect("memory store lock poisoned")
            .get(collection)
            .is_some_and(|documents| documents.contains_key(id)))
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        self.check_reachable()?;
        Ok(self
            .collections
            .read()
            .expect("memory store lock poisoned")
            .get(collection)
            .and_then(|documents| documents.get(id).cloned()))
    }

    async fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()> {
        self.check_reachable()?;
        self.collections
            .write()
            .expect("memory store lock poisoned")
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), record.clone());
        Ok(())
    }

    async fn query_desc(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> StoreResult<Vec<Value>> {
        self.check_reachable()?;
        let mut records: Vec<Value> = self
            .collections
            .read()
            .expect("memory store lock poisoned")
            .get(collection)
            .map(|documents| documents.values().cloned().collect())
            .unwrap_or_default();

        records.sort_by(|a, b| compare_field_values(&b[order_field], &a[order_field]));
        records.truncate(limit);
        Ok(records)
    }

    fn server_timestamp(&self) -> Value {
        json!(Utc::now().timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(timestamp: &str) -> Value {
        json!({ "symbol": "EURUSD", "timestamp": timestamp })
    }

    #[tokio::test]
    async fn put_then_exists_and_get() {
        let store = MemoryStore::new();
        store.put("trades", "a", &doc("2024-03-01 09:00:00")).await.unwrap();

        assert!(store.exists("trades", "a").await.unwrap());
        assert!(!store.exists("trades", "b").await.unwrap());
        assert_eq!(
            store.get("trades", "a").await.unwrap(),
            Some(doc("2024-03-01 09:00:00"))
        );
        assert_eq!(store.get("trades", "b").await.unwrap(), None);
    }

    #[tokio::test]
    async fn query_desc_orders_and_limits() {
        let store = MemoryStore::new();
        for (id, timestamp) in [
            ("a", "2024-03-01 09:00:00"),
            ("b", "2024-03-01 11:00:00"),
            ("c", "2024-03-01 10:00:00"),
        ] {
            store.put("trades", id, &doc(timestamp)).await.unwrap();
        }

        let window = store.query_desc("trades", "timestamp", 2).await.unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0]["timestamp"], "2024-03-01 11:00:00");
        assert_eq!(window[1]["timestamp"], "2024-03-01 10:00:00");
    }

    #[tokio::test]
    async fn query_desc_on_missing_collection_is_empty() {
        let store = MemoryStore::new();
        assert!(store.query_desc("trades", "timestamp", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failing_store_errors_on_every_call() {
        let store = MemoryStore::new();
        store.set_failing(true);

        assert!(matches!(
            store.exists("trades", "a").await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.put("trades", "a", &doc("t")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(
            store.query_desc("trades", "timestamp", 10).await,
            Err(StoreError::Unavailable(_))
        ));
    }
}
