// =============================================================================
// Trade stream boundary — raw trades and correction deltas
// =============================================================================
//
// The sole input surface from the upstream ingestion collaborator. The
// core never fetches anything itself; it consumes already-materialized
// trade tables wrapped in deltas.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::candle::PairId;

/// One raw trade.
///
/// `amount` is direction-signed: positive for a buy, negative for a sell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub pair_id: PairId,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub amount: f64,
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default)]
    pub block_number: Option<u64>,
}

impl Trade {
    pub fn is_buy(&self) -> bool {
        self.amount >= 0.0
    }
}

/// One update cycle from the trade source.
///
/// `start_ts` is the earliest instant whose downstream candles may have
/// changed; everything from there on is discarded and recomputed from
/// `trades`, which must therefore cover all trades needed from `start_ts`
/// onward. `start_ts` may move backward across cycles to express a
/// correction (chain reorg, late trade), never to silently lose finalized
/// history outside the stated window. `cycle` values seen by a single
/// feed are non-decreasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeDelta {
    pub cycle: u64,
    pub start_ts: NaiveDateTime,
    pub trades: Vec<Trade>,
}

/// A source of trade deltas. Implemented by the ingestion side; the core
/// only consumes the deltas it yields.
pub trait TradeFeed {
    /// Next update cycle, or `None` when the source is drained.
    fn next_delta(&mut self) -> Option<TradeDelta>;
}
