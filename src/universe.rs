// =============================================================================
// GroupedCandleUniverse — per-pair candle index with tolerant price lookup
// =============================================================================
//
// A read-mostly index over a candle snapshot. Construction partitions the
// table by pair and sorts each series by timestamp; afterwards the
// universe only answers queries. Merging new data means rebuilding from a
// fresh table (CandleFeed manages its own growing table directly).

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};
use tracing::debug;

use crate::candle::{Candle, PairId};
use crate::error::UniverseError;

pub struct GroupedCandleUniverse {
    series: HashMap<PairId, Vec<Candle>>,
}

impl GroupedCandleUniverse {
    /// Group a candle table by pair and sort each series ascending by
    /// timestamp. The input may arrive in any row order.
    pub fn new(candles: Vec<Candle>) -> Self {
        let mut series: HashMap<PairId, Vec<Candle>> = HashMap::new();
        for candle in candles {
            series.entry(candle.pair_id).or_default().push(candle);
        }
        for group in series.values_mut() {
            group.sort_by_key(|c| c.timestamp);
        }

        let candles: usize = series.values().map(Vec::len).sum();
        debug!(pairs = series.len(), candles, "grouped candle universe built");
        Self { series }
    }

    /// Number of distinct pairs present.
    pub fn get_pair_count(&self) -> usize {
        self.series.len()
    }

    /// Total candle rows across all pairs.
    pub fn get_candle_count(&self) -> usize {
        self.series.values().map(Vec::len).sum()
    }

    /// Full ascending series for one pair.
    pub fn get_candles_by_pair(&self, pair_id: PairId) -> Result<&[Candle], UniverseError> {
        self.series
            .get(&pair_id)
            .map(Vec::as_slice)
            .ok_or(UniverseError::PairNotFound(pair_id))
    }

    /// Candles known strictly before `timestamp`.
    ///
    /// The bar whose timestamp equals the query instant is still forming —
    /// its close would not be knowable yet in live or backtest use — so it
    /// is excluded unless `allow_current` is set. No row after `timestamp`
    /// is ever returned.
    ///
    /// Only defined for universes holding exactly one pair; any other
    /// universe cannot disambiguate the query and errors instead of
    /// guessing.
    pub fn get_single_pair_data(
        &self,
        timestamp: NaiveDateTime,
        allow_current: bool,
    ) -> Result<&[Candle], UniverseError> {
        let mut groups = self.series.values();
        match (groups.next(), groups.next()) {
            (Some(group), None) => {
                let end = if allow_current {
                    group.partition_point(|c| c.timestamp <= timestamp)
                } else {
                    group.partition_point(|c| c.timestamp < timestamp)
                };
                Ok(&group[..end])
            }
            _ => Err(UniverseError::AmbiguousPairs(self.series.len())),
        }
    }

    /// Close price of the latest candle at or before `when`, plus its
    /// staleness `when - candle.timestamp`.
    ///
    /// Binary search over the pair's ascending series. A candle exactly at
    /// `when` wins with distance zero, and the tolerance boundary is
    /// inclusive: `distance == tolerance` is accepted.
    pub fn get_price_with_tolerance(
        &self,
        pair_id: PairId,
        when: NaiveDateTime,
        tolerance: Duration,
    ) -> Result<(f64, Duration), UniverseError> {
        let group = self
            .series
            .get(&pair_id)
            .ok_or(UniverseError::PairNotFound(pair_id))?;

        let unavailable = UniverseError::CandleSampleUnavailable {
            pair_id,
            when,
            tolerance,
        };

        let idx = group.partition_point(|c| c.timestamp <= when);
        let Some(candle) = idx.checked_sub(1).and_then(|i| group.get(i)) else {
            return Err(unavailable);
        };

        let distance = when - candle.timestamp;
        if distance > tolerance {
            return Err(unavailable);
        }
        Ok((candle.close, distance))
    }
}
