// =============================================================================
// Candle — one OHLCV observation for one pair at one bucket boundary
// =============================================================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Opaque identifier for a tradable pair.
pub type PairId = u64;

/// A single OHLCV candle, stamped with the start of the bucket it covers.
///
/// `timestamp` is timezone-naive and bucket-aligned. Candles are immutable
/// once emitted; a correction replaces the affected rows wholesale instead
/// of mutating them (see `CandleFeed::apply_delta`).
///
/// The trailing fields only exist on chain-native feeds and stay `None`
/// elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub pair_id: PairId,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub buys: Option<u64>,
    #[serde(default)]
    pub sells: Option<u64>,
    #[serde(default)]
    pub start_block: Option<u64>,
    #[serde(default)]
    pub end_block: Option<u64>,
}

impl Candle {
    /// Canonical column order for any tabular serialization of candles.
    pub const COLUMNS: &'static [&'static str] = &[
        "pair_id",
        "timestamp",
        "open",
        "high",
        "low",
        "close",
        "volume",
        "exchange_rate",
        "buys",
        "sells",
        "start_block",
        "end_block",
    ];

    /// Build a flat candle (`open == high == low == close == price`) for
    /// hand-written test data.
    pub fn synthetic_sample(pair_id: PairId, timestamp: NaiveDateTime, price: f64) -> Self {
        Self {
            pair_id,
            timestamp,
            open: price,
            high: price,
            low: price,
            close: price,
            volume: 1.0,
            exchange_rate: None,
            buys: None,
            sells: None,
            start_block: None,
            end_block: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn synthetic_sample_is_flat() {
        let when = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let candle = Candle::synthetic_sample(1, when, 100.10);

        assert_eq!(candle.pair_id, 1);
        assert_eq!(candle.timestamp, when);
        assert_eq!(candle.open, 100.10);
        assert_eq!(candle.high, 100.10);
        assert_eq!(candle.low, 100.10);
        assert_eq!(candle.close, 100.10);
        assert!(candle.volume >= 0.0);
        assert_eq!(candle.exchange_rate, None);
        assert_eq!(candle.start_block, None);
    }

    #[test]
    fn canonical_columns_lead_with_required_fields() {
        assert_eq!(
            &Candle::COLUMNS[..7],
            &["pair_id", "timestamp", "open", "high", "low", "close", "volume"]
        );
    }

    #[test]
    fn optional_columns_default_when_absent() {
        // A candle table produced by a non-chain feed omits the extension
        // columns entirely.
        let json = r#"{
            "pair_id": 1,
            "timestamp": "2020-01-01T00:00:00",
            "open": 100.0,
            "high": 101.0,
            "low": 99.0,
            "close": 100.5,
            "volume": 12.5
        }"#;
        let candle: Candle = serde_json::from_str(json).expect("should parse");
        assert_eq!(candle.close, 100.5);
        assert_eq!(candle.buys, None);
        assert_eq!(candle.sells, None);
        assert_eq!(candle.end_block, None);
    }
}
