// =============================================================================
// CandleFeed — owned candle table with delta-driven recomputation
// =============================================================================
//
// Owns the growing candle table for a set of tracked pairs and a single
// timeframe. Updates arrive as TradeDeltas: rows inside the delta's
// correction window are discarded and recomputed from the delta's trades.
// Corrections never mutate candles in place; superseded rows are dropped
// and replaced wholesale.
//
// The rebuild costs O(table size) per delta. Acceptable while the
// correction window stays small relative to history; a bucket-keyed ring
// would bring truncation down to O(log n + k) without changing this
// surface.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::candle::{Candle, PairId};
use crate::error::FeedError;
use crate::resample::{get_feed_for_pair, ohlcv_resample_trades};
use crate::timeframe::Timeframe;
use crate::trade::{Trade, TradeDelta};

/// Candle series for a set of tracked pairs on one timeframe, advanced by
/// applying trade deltas.
pub struct CandleFeed {
    timeframe: Timeframe,
    pairs: HashSet<PairId>,
    /// Replaced wholesale on every delta so concurrent readers observe
    /// either the previous complete table or the next complete table,
    /// never a truncated-but-not-refilled intermediate.
    table: RwLock<Arc<Vec<Candle>>>,
    last_cycle: AtomicU64,
}

impl CandleFeed {
    pub fn new(pairs: impl IntoIterator<Item = PairId>, timeframe: Timeframe) -> Self {
        Self {
            timeframe,
            pairs: pairs.into_iter().collect(),
            table: RwLock::new(Arc::new(Vec::new())),
            last_cycle: AtomicU64::new(0),
        }
    }

    pub fn timeframe(&self) -> &Timeframe {
        &self.timeframe
    }

    /// Cycle counter of the last applied delta.
    pub fn last_cycle(&self) -> u64 {
        self.last_cycle.load(Ordering::Acquire)
    }

    /// Cheap snapshot of the current table, ordered by
    /// `(timestamp, pair_id)`. The snapshot stays untouched by later
    /// deltas.
    pub fn table(&self) -> Arc<Vec<Candle>> {
        Arc::clone(&self.table.read())
    }

    /// One pair's candles from the current table, in timestamp order.
    /// Empty when the feed has no rows for the pair yet.
    pub fn get_candles_by_pair(&self, pair_id: PairId) -> Vec<Candle> {
        get_feed_for_pair(&self.table(), pair_id)
    }

    /// Apply one update cycle from the trade source.
    ///
    /// Rows from the bucket containing `delta.start_ts` onward are
    /// discarded and recomputed from `delta.trades`; trades for pairs this
    /// feed does not track are ignored. Applying the same delta twice
    /// yields the same table, so retries are safe.
    ///
    /// Writers must be serialized by the caller; readers may run
    /// concurrently with a write (see [`CandleFeed::table`]).
    pub fn apply_delta(&self, delta: &TradeDelta) -> Result<(), FeedError> {
        let last = self.last_cycle.load(Ordering::Acquire);
        if delta.cycle < last {
            return Err(FeedError::NonMonotonicCycle {
                got: delta.cycle,
                last,
            });
        }

        // A mid-bucket start_ts invalidates that whole bucket: its candle
        // can only be rebuilt from the delta's trades.
        let cutoff = self.timeframe.bucket_start(delta.start_ts);

        let snapshot = self.table();
        let prefix: Vec<Candle> = snapshot
            .iter()
            .filter(|c| c.timestamp < cutoff)
            .cloned()
            .collect();
        let truncated = snapshot.len() - prefix.len();

        let tracked: Vec<Trade> = delta
            .trades
            .iter()
            .filter(|t| self.pairs.contains(&t.pair_id))
            .cloned()
            .collect();
        let ignored = delta.trades.len() - tracked.len();
        if ignored > 0 {
            warn!(cycle = delta.cycle, ignored, "delta contains trades for untracked pairs");
        }

        let suffix = ohlcv_resample_trades(&tracked, &self.timeframe);
        if let Some(stale) = suffix.iter().find(|c| c.timestamp < cutoff) {
            return Err(FeedError::OverlappingDelta {
                pair_id: stale.pair_id,
                timestamp: stale.timestamp,
            });
        }
        let resampled = suffix.len();

        // Prefix rows all precede the cutoff and suffix rows all start at
        // or after it, so plain concatenation preserves table order.
        let mut next = prefix;
        next.extend(suffix);

        debug!(
            cycle = delta.cycle,
            truncated,
            resampled,
            total = next.len(),
            "applied trade delta"
        );

        *self.table.write() = Arc::new(next);
        self.last_cycle.store(delta.cycle, Ordering::Release);
        Ok(())
    }
}
