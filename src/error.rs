// =============================================================================
// Error taxonomy
// =============================================================================
//
// Two families: recoverable query conditions the caller is expected to
// handle (unknown pair, no candle close enough), and contract violations
// from a misbehaving collaborator (cycle regression, a delta that reaches
// further back than it declared). Nothing is retried internally.

use chrono::{Duration, NaiveDateTime};

use crate::candle::PairId;

/// Errors from the read-only candle universe accessors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    /// The requested pair has no candles in this universe.
    #[error("pair {0} not found in candle universe")]
    PairNotFound(PairId),

    /// A single-pair query was issued against a universe that does not
    /// hold exactly one pair.
    #[error("single-pair query on a universe holding {0} pairs")]
    AmbiguousPairs(usize),

    /// No candle lies at or before `when` within `tolerance`.
    ///
    /// Expected and recoverable: the caller may widen the tolerance or
    /// treat the instant as missing data.
    #[error("no candle for pair {pair_id} within {tolerance} of {when}")]
    CandleSampleUnavailable {
        pair_id: PairId,
        when: NaiveDateTime,
        tolerance: Duration,
    },
}

/// Contract violations raised while applying a trade delta.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FeedError {
    /// Delta cycles observed by one feed must be non-decreasing.
    #[error("delta cycle {got} precedes last applied cycle {last}")]
    NonMonotonicCycle { got: u64, last: u64 },

    /// A resampled candle landed on a bucket retained from before the
    /// correction window, so the delta's `start_ts` under-declared how far
    /// back its trades reach. Merging silently would duplicate bars.
    #[error("resampled candle for pair {pair_id} at {timestamp} overlaps history retained before the correction window")]
    OverlappingDelta {
        pair_id: PairId,
        timestamp: NaiveDateTime,
    },
}

/// Rejected timeframe construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TimeframeError {
    /// Bucket arithmetic runs at millisecond resolution; the duration must
    /// be at least one millisecond.
    #[error("timeframe duration must be a positive number of milliseconds, got {0}")]
    NonPositiveDuration(Duration),
}
