use serde::{Deserialize, Serialize};

use crate::types::TradeRecord;

/// Sentinel reported as `last_trade_time` when the queried window is empty.
pub const NO_TRADES_YET: &str = "No trades yet";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub total_trades: usize,
    pub total_profit: f64,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub avg_profit: f64,
    pub last_trade_time: String,
}

impl TradeStats {
    fn empty() -> Self {
        Self {
            total_trades: 0,
            total_profit: 0.0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: 0.0,
            avg_profit: 0.0,
            last_trade_time: NO_TRADES_YET.to_string(),
        }
    }
}

/// Summarizes a window of trades. Expects the window ordered most recent
/// first: `last_trade_time` is taken from the head of the slice.
///
/// Never fails: absent or unparseable profit contributes zero to the sums
/// and is not counted as a win.
pub fn calculate_stats(trades: &[TradeRecord]) -> TradeStats {
    if trades.is_empty() {
        return TradeStats::empty();
    }

    let total_trades = trades.len();
    let total_profit: f64 = trades.iter().map(TradeRecord::profit_or_zero).sum();
    let winning_trades = trades
        .iter()
        .filter(|trade| trade.profit_or_zero() > 0.0)
        .count();
    let losing_trades = total_trades - winning_trades;
    let win_rate = winning_trades as f64 / total_trades as f64 * 100.0;
    let avg_profit = total_profit / total_trades as f64;

    TradeStats {
        total_trades,
        total_profit: round2(total_profit),
        winning_trades,
        losing_trades,
        win_rate: round2(win_rate),
        avg_profit: round2(avg_profit),
        last_trade_time: trades[0].timestamp.clone(),
    }
}

/// Round to two decimal places, the precision everything user-facing uses.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
