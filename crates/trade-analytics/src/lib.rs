use std::cmp::Reverse;
use std::sync::Arc;

use serde::Serialize;

use dashboard_core::{calculate_stats, equity_curve, EquityPoint, TradeRecord, TradeStats, INGESTED_AT_FIELD};
use trade_store::{StoreResult, TradeStore};

#[cfg(test)]
mod tests;

/// Default window for the raw trade listing.
pub const LIST_WINDOW: usize = 50;
/// Window the summary statistics are computed over.
pub const STATS_WINDOW: usize = 1000;
/// Window the equity curve is computed over.
pub const CURVE_WINDOW: usize = 100;

/// Store connectivity diagnostic.
#[derive(Debug, Clone, Serialize)]
pub struct StoreProbe {
    pub trade_count: usize,
    pub sample_trade: Option<TradeRecord>,
}

/// Read side of the dashboard: bounded most-recent-first windows of stored
/// trades and the aggregates derived from them.
///
/// Storage errors propagate to the caller, so "no trades" and "store
/// unreachable" are distinct outcomes and the HTTP layer maps them to
/// different statuses.
pub struct DashboardService {
    store: Arc<dyn TradeStore>,
    collection: String,
}

impl DashboardService {
    pub fn new(store: Arc<dyn TradeStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Up to `limit` stored trades, most recent first.
    ///
    /// The ingestion-timestamp field is stripped before decoding. Records
    /// that do not decode as trades are dropped with a warning rather than
    /// failing the whole read. The window is re-sorted chronologically
    /// after decode, so mixed timestamp formats cannot scramble it.
    pub async fn recent_trades(&self, limit: usize) -> StoreResult<Vec<TradeRecord>> {
        let window = self
            .store
            .query_desc(&self.collection, "timestamp", limit)
            .await?;

        let mut trades: Vec<TradeRecord> = window
            .into_iter()
            .filter_map(|mut document| {
                if let Some(fields) = document.as_object_mut() {
                    fields.remove(INGESTED_AT_FIELD);
                }
                match serde_json::from_value(document) {
                    Ok(trade) => Some(trade),
                    Err(err) => {
                        tracing::warn!("dropping undecodable trade record: {err}");
                        None
                    }
                }
            })
            .collect();

        trades.sort_by_key(|trade| Reverse(trade.time_key()));
        Ok(trades)
    }

    /// Summary statistics over the most recent [`STATS_WINDOW`] trades.
    pub async fn stats(&self) -> StoreResult<TradeStats> {
        let trades = self.recent_trades(STATS_WINDOW).await?;
        Ok(calculate_stats(&trades))
    }

    /// Cumulative equity curve over the most recent [`CURVE_WINDOW`] trades.
    pub async fn equity_curve(&self) -> StoreResult<Vec<EquityPoint>> {
        let trades = self.recent_trades(CURVE_WINDOW).await?;
        Ok(equity_curve(&trades))
    }

    /// Reads the stats window to prove the store is reachable, returning
    /// the trade count and one sample record.
    pub async fn connectivity_probe(&self) -> StoreResult<StoreProbe> {
        let trades = self.recent_trades(STATS_WINDOW).await?;
        Ok(StoreProbe {
            trade_count: trades.len(),
            sample_trade: trades.into_iter().next(),
        })
    }
}
