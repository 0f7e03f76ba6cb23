use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;

/// The document store the dashboard reads from and the ingestor writes to.
///
/// Documents are addressed by collection name and document id. The store is
/// external and provides its own consistency; this trait only promises
/// existence-check, point write, and a descending ordered range read.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Whether a document with this id exists in the collection.
    async fn exists(&self, collection: &str, id: &str) -> StoreResult<bool>;

    /// Point read. `None` when the document is absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Point write, full overwrite of any existing document.
    async fn put(&self, collection: &str, id: &str, record: &Value) -> StoreResult<()>;

    /// Up to `limit` documents ordered descending by `order_field`,
    /// using the store's native value ordering.
    async fn query_desc(
        &self,
        collection: &str,
        order_field: &str,
        limit: usize,
    ) -> StoreResult<Vec<Value>>;

    /// The value to write when a field should carry the store's own
    /// ingestion timestamp rather than a client-supplied one.
    fn server_timestamp(&self) -> Value;
}

/// The store's native ordering over field values: grouped by type
/// (null < bool < number < string < everything else), compared within the
/// group. Matches what a Firebase-style store does server-side, so both
/// implementations agree on query order.
pub(crate) fn compare_field_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            _ => 4,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
