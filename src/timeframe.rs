// =============================================================================
// Timeframe — fixed bucket width for candle aggregation
// =============================================================================

use chrono::{Duration, NaiveDateTime};

use crate::error::TimeframeError;

/// Width of one aggregation bucket: a duration plus an optional sub-bucket
/// offset. Stateless and immutable; used purely as a parameter to
/// bucketing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeframe {
    duration: Duration,
    offset: Duration,
}

impl Timeframe {
    /// A timeframe with no offset.
    pub fn new(duration: Duration) -> Result<Self, TimeframeError> {
        Self::with_offset(duration, Duration::zero())
    }

    /// A timeframe whose bucket boundaries are shifted by `offset` from
    /// the epoch grid (e.g. hourly candles opening at :05).
    pub fn with_offset(duration: Duration, offset: Duration) -> Result<Self, TimeframeError> {
        if duration.num_milliseconds() <= 0 {
            return Err(TimeframeError::NonPositiveDuration(duration));
        }
        Ok(Self { duration, offset })
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Start of the bucket `instant` falls into:
    ///
    /// `floor((instant - offset) / duration) * duration + offset`
    ///
    /// Euclidean flooring keeps pre-epoch instants in the correct bucket.
    pub fn bucket_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let dur_ms = self.duration.num_milliseconds();
        let off_ms = self.offset.num_milliseconds();

        let utc = instant.and_utc();
        let ts_ms = utc.timestamp_millis();
        // Sub-millisecond remainder, stripped so the result lands exactly
        // on the bucket boundary.
        let sub_ms_ns = i64::from(utc.timestamp_subsec_nanos() % 1_000_000);

        let floored = (ts_ms - off_ms).div_euclid(dur_ms) * dur_ms + off_ms;
        instant - Duration::milliseconds(ts_ms - floored) - Duration::nanoseconds(sub_ms_ns)
    }
}
