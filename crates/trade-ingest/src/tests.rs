use std::sync::Arc;

use serde_json::{json, Value};

use dashboard_core::INGESTED_AT_FIELD;
use trade_store::{MemoryStore, TradeStore};

use crate::{IngestReport, TradeIngestor};

fn ingestor() -> (Arc<MemoryStore>, TradeIngestor) {
    let store = Arc::new(MemoryStore::new());
    let ingestor = TradeIngestor::new(store.clone() as Arc<dyn TradeStore>, "trades");
    (store, ingestor)
}

fn record(symbol: &str, timestamp: &str, profit: f64) -> Value {
    json!({
        "symbol": symbol,
        "trade_type": "buy",
        "timestamp": timestamp,
        "profit": profit,
    })
}

#[tokio::test]
async fn uploads_distinct_records() {
    let (store, ingestor) = ingestor();

    let report = ingestor
        .process_uploaded(vec![
            record("EURUSD", "2024-03-01 09:00:00", 50.0),
            record("EURUSD", "2024-03-01 10:00:00", -20.0),
            record("GBPUSD", "2024-03-01 09:00:00", 5.0),
        ])
        .await;

    assert_eq!(
        report,
        IngestReport {
            uploaded: 3,
            skipped_existing: 0,
            failed: 0
        }
    );
    assert_eq!(store.len("trades"), 3);
}

#[tokio::test]
async fn resubmission_is_idempotent() {
    let (store, ingestor) = ingestor();
    let trade = record("EURUSD", "2024-03-01 09:00:00", 50.0);

    let first = ingestor.process_uploaded(vec![trade.clone()]).await;
    let second = ingestor.process_uploaded(vec![trade]).await;

    assert_eq!(first.uploaded + second.uploaded, 1);
    assert_eq!(second.skipped_existing, 1);
    assert_eq!(store.len("trades"), 1);
}

#[tokio::test]
async fn stored_record_carries_ingestion_timestamp_and_passthrough_fields() {
    let (store, ingestor) = ingestor();
    let mut trade = record("EURUSD", "2024-03-01 09:00:00", 50.0);
    trade["magic_number"] = json!(777);

    ingestor.process_uploaded(vec![trade]).await;

    let stored = store
        .get("trades", "EURUSD_2024-03-01_09-00-00")
        .await
        .unwrap()
        .expect("record was written");
    assert!(stored.get(INGESTED_AT_FIELD).is_some());
    assert_eq!(stored["magic_number"], json!(777));
    assert_eq!(stored["profit"], json!(50.0));
}

#[tokio::test]
async fn invalid_records_are_skipped_without_aborting_the_batch() {
    let (store, ingestor) = ingestor();

    let report = ingestor
        .process_uploaded(vec![
            json!({"timestamp": "2024-03-01 09:00:00"}), // no symbol
            json!({"symbol": "EURUSD"}),                 // no timestamp
            json!({"symbol": "", "timestamp": "t"}),     // empty symbol
            json!(42),                                   // not an object
            record("GBPUSD", "2024-03-01 10:00:00", 1.0),
        ])
        .await;

    assert_eq!(report.failed, 4);
    assert_eq!(report.uploaded, 1);
    assert_eq!(store.len("trades"), 1);
}

#[tokio::test]
async fn storage_failure_counts_as_failed() {
    let (store, ingestor) = ingestor();
    store.set_failing(true);

    let report = ingestor
        .process_uploaded(vec![record("EURUSD", "2024-03-01 09:00:00", 50.0)])
        .await;

    assert_eq!(
        report,
        IngestReport {
            uploaded: 0,
            skipped_existing: 0,
            failed: 1
        }
    );
}
