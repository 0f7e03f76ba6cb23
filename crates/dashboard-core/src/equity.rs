use serde::{Deserialize, Serialize};

use crate::stats::round2;
use crate::types::TradeRecord;

/// One point on the cumulative profit curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: String,
    pub equity: f64,
}

/// Builds the cumulative equity curve over a window of trades.
///
/// Trades are ordered ascending by [`TimeKey`](crate::types::TimeKey)
/// before accumulation, so the input window order is irrelevant to the
/// output. The sort is stable: records with identical timestamps keep
/// their input order. An empty window yields an empty curve.
pub fn equity_curve(trades: &[TradeRecord]) -> Vec<EquityPoint> {
    let mut ordered: Vec<&TradeRecord> = trades.iter().collect();
    ordered.sort_by_key(|trade| trade.time_key());

    let mut running = 0.0;
    ordered
        .into_iter()
        .map(|trade| {
            running += trade.profit_or_zero();
            EquityPoint {
                date: trade.equity_date().to_string(),
                equity: round2(running),
            }
        })
        .collect()
}
