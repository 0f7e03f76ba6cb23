use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Storage-assigned ingestion timestamp. Attached by the ingestor when a
/// record is first written, stripped again before any record leaves the
/// read API. It never appears in a client-visible payload.
pub const INGESTED_AT_FIELD: &str = "firebase_timestamp";

/// Timestamp formats accepted as canonical trade time. The first form
/// tolerates fractional seconds as produced by some MT4/MT5 exports.
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// One logged trading event as reported by the external trading system.
///
/// Only the fields the dashboard computes over are typed; everything else
/// the uploader sends rides along in `extra` and is stored and returned
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trade_type: Option<String>,
    /// Open/record time. Kept textual; ordering goes through [`TimeKey`].
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_time: Option<String>,
    /// Realized profit/loss. Uploaders are not consistent about the JSON
    /// type here, so numbers and numeric strings are both accepted and
    /// anything else reads as absent.
    #[serde(
        default,
        deserialize_with = "lenient_profit",
        skip_serializing_if = "Option::is_none"
    )]
    pub profit: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TradeRecord {
    /// Profit with the absent/unparseable case coerced to zero.
    pub fn profit_or_zero(&self) -> f64 {
        self.profit.unwrap_or(0.0)
    }

    /// Dedup/storage key for this record.
    pub fn trade_id(&self) -> String {
        trade_id(&self.symbol, &self.timestamp)
    }

    /// Sort key for chronological ordering.
    pub fn time_key(&self) -> TimeKey {
        TimeKey::parse(&self.timestamp)
    }

    /// X-axis value for the equity curve: close time when the trade has
    /// one, otherwise the open time.
    pub fn equity_date(&self) -> &str {
        self.close_time.as_deref().unwrap_or(&self.timestamp)
    }
}

/// Builds the derived trade identifier: `{symbol}_{sanitized timestamp}`,
/// with spaces, colons and periods replaced so the result is safe as a
/// document key. Two records with the same symbol and timestamp always
/// collapse to the same identifier.
pub fn trade_id(symbol: &str, timestamp: &str) -> String {
    let sanitized: String = timestamp
        .chars()
        .map(|c| match c {
            ' ' => '_',
            ':' => '-',
            '.' => '_',
            other => other,
        })
        .collect();
    format!("{symbol}_{sanitized}")
}

/// Total order over trade timestamps.
///
/// Canonical-format timestamps compare chronologically; anything that does
/// not parse falls back to lexical comparison and orders before every
/// parsed timestamp. The raw text rides along as tiebreak so the order is
/// deterministic either way.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum TimeKey {
    Raw(String),
    Parsed(NaiveDateTime, String),
}

impl TimeKey {
    pub fn parse(raw: &str) -> Self {
        for format in TIMESTAMP_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
                return TimeKey::Parsed(parsed, raw.to_string());
            }
        }
        TimeKey::Raw(raw.to_string())
    }
}

fn lenient_profit<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}
