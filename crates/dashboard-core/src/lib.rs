pub mod equity;
pub mod stats;
pub mod types;

pub use equity::{equity_curve, EquityPoint};
pub use stats::{calculate_stats, TradeStats, NO_TRADES_YET};
pub use types::{trade_id, TimeKey, TradeRecord, INGESTED_AT_FIELD};
