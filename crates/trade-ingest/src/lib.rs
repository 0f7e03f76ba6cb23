use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use dashboard_core::{trade_id, INGESTED_AT_FIELD};
use trade_store::{StoreError, TradeStore};

#[cfg(test)]
mod tests;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("trade record is not a JSON object")]
    NotAnObject,

    #[error("missing or empty `{0}` field")]
    MissingField(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What happened to a batch of uploaded trade records.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Records newly written to the store.
    pub uploaded: usize,
    /// Records whose id was already present; re-submission is idempotent.
    pub skipped_existing: usize,
    /// Records dropped for validation or storage failures.
    pub failed: usize,
}

enum UploadOutcome {
    Uploaded,
    AlreadyStored,
}

/// Writes uploaded trade records into the trade collection, deduplicated
/// by the derived trade identifier.
pub struct TradeIngestor {
    store: Arc<dyn TradeStore>,
    collection: String,
}

impl TradeIngestor {
    pub fn new(store: Arc<dyn TradeStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Processes a batch of trade-record-like JSON objects.
    ///
    /// One record failing validation or storage never aborts the batch:
    /// the failure is logged, counted, and processing continues. The
    /// existence-check-then-write pair is not atomic, so two concurrent
    /// uploads of the same record can both land. Best-effort dedup, not
    /// a transactional guarantee.
    pub async fn process_uploaded(&self, batch: Vec<Value>) -> IngestReport {
        let mut report = IngestReport::default();

        for record in batch {
            match self.upload_one(record).await {
                Ok(UploadOutcome::Uploaded) => report.uploaded += 1,
                Ok(UploadOutcome::AlreadyStored) => report.skipped_existing += 1,
                Err(err) => {
                    tracing::warn!("skipping trade record: {err}");
                    report.failed += 1;
                }
            }
        }

        report
    }

    async fn upload_one(&self, mut record: Value) -> Result<UploadOutcome, IngestError> {
        let (id, symbol) = {
            let fields = record.as_object().ok_or(IngestError::NotAnObject)?;
            let symbol = required_field(fields, "symbol")?;
            let timestamp = required_field(fields, "timestamp")?;
            (trade_id(symbol, timestamp), symbol.to_string())
        };

        if self.store.exists(&self.collection, &id).await? {
            tracing::debug!(trade_id = %id, "trade already stored, skipping");
            return Ok(UploadOutcome::AlreadyStored);
        }

        if let Some(fields) = record.as_object_mut() {
            fields.insert(
                INGESTED_AT_FIELD.to_string(),
                self.store.server_timestamp(),
            );
        }

        self.store.put(&self.collection, &id, &record).await?;
        tracing::info!(trade_id = %id, %symbol, "uploaded trade");

        Ok(UploadOutcome::Uploaded)
    }
}

fn required_field<'a>(
    fields: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, IngestError> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .ok_or(IngestError::MissingField(name))
}
