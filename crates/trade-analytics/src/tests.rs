use std::sync::Arc;

use serde_json::json;

use dashboard_core::NO_TRADES_YET;
use trade_store::{MemoryStore, StoreError, TradeStore};

use crate::DashboardService;

async fn seeded_service(timestamps_and_profits: &[(&str, f64)]) -> (Arc<MemoryStore>, DashboardService) {
    let store = Arc::new(MemoryStore::new());
    for (i, (timestamp, profit)) in timestamps_and_profits.iter().enumerate() {
        let record = json!({
            "symbol": "EURUSD",
            "trade_type": "buy",
            "timestamp": timestamp,
            "profit": profit,
            "firebase_timestamp": 1_700_000_000_000_i64 + i as i64,
        });
        store.put("trades", &format!("doc-{i}"), &record).await.unwrap();
    }
    let service = DashboardService::new(store.clone() as Arc<dyn TradeStore>, "trades");
    (store, service)
}

#[tokio::test]
async fn recent_trades_are_most_recent_first_and_limited() {
    let (_, service) = seeded_service(&[
        ("2024-03-01 09:00:00", 1.0),
        ("2024-03-01 13:00:00", 2.0),
        ("2024-03-01 10:00:00", 3.0),
        ("2024-03-01 12:00:00", 4.0),
        ("2024-03-01 11:00:00", 5.0),
    ])
    .await;

    let trades = service.recent_trades(2).await.unwrap();
    assert_eq!(trades.len(), 2);
    assert_eq!(trades[0].timestamp, "2024-03-01 13:00:00");
    assert_eq!(trades[1].timestamp, "2024-03-01 12:00:00");
}

#[tokio::test]
async fn ingestion_timestamp_never_leaves_the_read_api() {
    let (_, service) = seeded_service(&[("2024-03-01 09:00:00", 1.0)]).await;

    let trades = service.recent_trades(10).await.unwrap();
    let as_json = serde_json::to_value(&trades[0]).unwrap();
    assert!(as_json.get("firebase_timestamp").is_none());
}

#[tokio::test]
async fn stats_cover_the_stored_window() {
    let (_, service) = seeded_service(&[
        ("2024-03-01 09:00:00", 100.0),
        ("2024-03-01 10:00:00", -40.0),
        ("2024-03-01 11:00:00", 10.0),
    ])
    .await;

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_trades, 3);
    assert_eq!(stats.total_profit, 70.0);
    assert_eq!(stats.win_rate, 66.67);
    assert_eq!(stats.last_trade_time, "2024-03-01 11:00:00");
}

#[tokio::test]
async fn stats_over_empty_store_use_the_sentinel() {
    let store = Arc::new(MemoryStore::new());
    let service = DashboardService::new(store as Arc<dyn TradeStore>, "trades");

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total_trades, 0);
    assert_eq!(stats.last_trade_time, NO_TRADES_YET);
}

#[tokio::test]
async fn equity_curve_is_ascending_regardless_of_window_order() {
    let (_, service) = seeded_service(&[
        ("2024-03-01 10:00:00", -20.0),
        ("2024-03-01 09:00:00", 50.0),
    ])
    .await;

    let curve = service.equity_curve().await.unwrap();
    assert_eq!(curve.len(), 2);
    assert_eq!(curve[0].date, "2024-03-01 09:00:00");
    assert_eq!(curve[0].equity, 50.0);
    assert_eq!(curve[1].equity, 30.0);
}

#[tokio::test]
async fn undecodable_documents_are_dropped_not_fatal() {
    let (store, service) = seeded_service(&[("2024-03-01 09:00:00", 1.0)]).await;
    store
        .put("trades", "junk", &json!({"note": "not a trade"}))
        .await
        .unwrap();

    let trades = service.recent_trades(10).await.unwrap();
    assert_eq!(trades.len(), 1);
}

#[tokio::test]
async fn store_failure_surfaces_as_an_error() {
    let (store, service) = seeded_service(&[("2024-03-01 09:00:00", 1.0)]).await;
    store.set_failing(true);

    assert!(matches!(
        service.recent_trades(10).await,
        Err(StoreError::Unavailable(_))
    ));
    assert!(service.stats().await.is_err());
    assert!(service.equity_curve().await.is_err());
}

#[tokio::test]
async fn connectivity_probe_reports_count_and_sample() {
    let (_, service) = seeded_service(&[
        ("2024-03-01 09:00:00", 1.0),
        ("2024-03-01 10:00:00", 2.0),
    ])
    .await;

    let probe = service.connectivity_probe().await.unwrap();
    assert_eq!(probe.trade_count, 2);
    assert_eq!(
        probe.sample_trade.unwrap().timestamp,
        "2024-03-01 10:00:00"
    );
}
