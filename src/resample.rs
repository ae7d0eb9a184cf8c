// =============================================================================
// OHLCV resampler — trade table → bucketed candles
// =============================================================================
//
// Pure, stateless transformation: every (pair, bucket) with at least one
// trade yields exactly one candle; empty buckets yield nothing. Filling
// gaps forward is the consumer's responsibility, not this layer's.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use tracing::warn;

use crate::candle::{Candle, PairId};
use crate::timeframe::Timeframe;
use crate::trade::Trade;

/// Resample a trade table into OHLCV candles for one timeframe.
///
/// Within a bucket: `open`/`close` come from the chronologically first and
/// last trade, `high`/`low` from the price extremes, `volume` is the sum
/// of absolute trade sizes, `buys`/`sells` count trades by direction.
/// `exchange_rate` carries the last rate seen and `start_block`/
/// `end_block` span the block numbers, when present. A one-trade bucket
/// has `open == high == low == close`.
///
/// The input does not need to be sorted — out-of-order delivery is common
/// with streaming and reorg sources — so a working copy is sorted first
/// (stably, keeping arrival order for equal timestamps). Output rows are
/// ordered by `(timestamp, pair_id)` and identical across repeated calls
/// with the same input.
pub fn ohlcv_resample_trades(trades: &[Trade], timeframe: &Timeframe) -> Vec<Candle> {
    let mut ordered: Vec<&Trade> = trades.iter().collect();
    if !ordered.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
        warn!(trades = trades.len(), "trade input not sorted by timestamp, sorting");
    }
    ordered.sort_by_key(|t| t.timestamp);

    let mut buckets: BTreeMap<(NaiveDateTime, PairId), Candle> = BTreeMap::new();
    for trade in ordered {
        let bucket = timeframe.bucket_start(trade.timestamp);
        let size = trade.amount.abs();
        let (buy, sell) = if trade.is_buy() { (1, 0) } else { (0, 1) };

        buckets
            .entry((bucket, trade.pair_id))
            .and_modify(|candle| {
                candle.high = candle.high.max(trade.price);
                candle.low = candle.low.min(trade.price);
                candle.close = trade.price;
                candle.volume += size;
                candle.buys = candle.buys.map(|n| n + buy);
                candle.sells = candle.sells.map(|n| n + sell);
                if trade.exchange_rate.is_some() {
                    candle.exchange_rate = trade.exchange_rate;
                }
                if let Some(block) = trade.block_number {
                    candle.start_block =
                        Some(candle.start_block.map_or(block, |b| b.min(block)));
                    candle.end_block = Some(candle.end_block.map_or(block, |b| b.max(block)));
                }
            })
            .or_insert_with(|| Candle {
                pair_id: trade.pair_id,
                timestamp: bucket,
                open: trade.price,
                high: trade.price,
                low: trade.price,
                close: trade.price,
                volume: size,
                exchange_rate: trade.exchange_rate,
                buys: Some(buy),
                sells: Some(sell),
                start_block: trade.block_number,
                end_block: trade.block_number,
            });
    }

    buckets.into_values().collect()
}

/// Extract one pair's rows from a multi-pair candle table, preserving
/// timestamp order.
///
/// A pair with no rows yields an empty table rather than an error: the
/// input is a filter target that may legitimately not contain the pair
/// yet. `GroupedCandleUniverse` is the erroring surface for unknown ids.
pub fn get_feed_for_pair(table: &[Candle], pair_id: PairId) -> Vec<Candle> {
    table
        .iter()
        .filter(|c| c.pair_id == pair_id)
        .cloned()
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn ts(h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn trade(pair_id: PairId, timestamp: NaiveDateTime, price: f64, amount: f64) -> Trade {
        Trade {
            pair_id,
            timestamp,
            price,
            amount,
            exchange_rate: None,
            block_number: None,
        }
    }

    fn hourly() -> Timeframe {
        Timeframe::new(Duration::hours(1)).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_table() {
        assert!(ohlcv_resample_trades(&[], &hourly()).is_empty());
    }

    #[test]
    fn one_trade_bucket_is_flat() {
        let candles = ohlcv_resample_trades(&[trade(1, ts(10, 17, 3), 101.5, -2.0)], &hourly());
        assert_eq!(candles.len(), 1);

        let c = &candles[0];
        assert_eq!(c.timestamp, ts(10, 0, 0));
        assert_eq!(c.open, 101.5);
        assert_eq!(c.high, 101.5);
        assert_eq!(c.low, 101.5);
        assert_eq!(c.close, 101.5);
        assert_eq!(c.volume, 2.0); // absolute size of the sell
        assert_eq!(c.buys, Some(0));
        assert_eq!(c.sells, Some(1));
    }

    #[test]
    fn bucket_aggregates_first_last_extremes() {
        let trades = vec![
            trade(1, ts(10, 0, 5), 100.0, 1.0),
            trade(1, ts(10, 20, 0), 105.0, -3.0),
            trade(1, ts(10, 40, 0), 98.0, 2.0),
            trade(1, ts(10, 59, 59), 102.0, 1.5),
        ];
        let candles = ohlcv_resample_trades(&trades, &hourly());
        assert_eq!(candles.len(), 1);

        let c = &candles[0];
        assert_eq!(c.open, 100.0);
        assert_eq!(c.close, 102.0);
        assert_eq!(c.high, 105.0);
        assert_eq!(c.low, 98.0);
        assert_eq!(c.volume, 7.5);
        assert_eq!(c.buys, Some(3));
        assert_eq!(c.sells, Some(1));
    }

    #[test]
    fn unsorted_input_is_sorted_before_open_close_extraction() {
        let sorted = vec![
            trade(1, ts(10, 1, 0), 100.0, 1.0),
            trade(1, ts(10, 30, 0), 104.0, 1.0),
            trade(1, ts(10, 55, 0), 99.0, 1.0),
        ];
        let mut shuffled = sorted.clone();
        shuffled.swap(0, 2);

        let from_sorted = ohlcv_resample_trades(&sorted, &hourly());
        let from_shuffled = ohlcv_resample_trades(&shuffled, &hourly());

        assert_eq!(from_shuffled[0].open, 100.0);
        assert_eq!(from_shuffled[0].close, 99.0);
        assert_eq!(from_sorted, from_shuffled);
    }

    #[test]
    fn resampling_is_deterministic() {
        let trades = vec![
            trade(2, ts(11, 5, 0), 50.0, 4.0),
            trade(1, ts(10, 1, 0), 100.0, 1.0),
            trade(1, ts(11, 2, 0), 101.0, -1.0),
            trade(2, ts(10, 59, 0), 49.0, -4.0),
        ];
        let first = ohlcv_resample_trades(&trades, &hourly());
        let second = ohlcv_resample_trades(&trades, &hourly());
        assert_eq!(first, second);
    }

    #[test]
    fn pairs_bucket_independently() {
        let trades = vec![
            trade(1, ts(10, 5, 0), 100.0, 1.0),
            trade(2, ts(10, 6, 0), 50.0, 1.0),
            trade(1, ts(10, 7, 0), 101.0, 1.0),
        ];
        let candles = ohlcv_resample_trades(&trades, &hourly());
        assert_eq!(candles.len(), 2);

        // Shared bucket start, ordered by pair id within it.
        assert_eq!(candles[0].pair_id, 1);
        assert_eq!(candles[0].close, 101.0);
        assert_eq!(candles[1].pair_id, 2);
        assert_eq!(candles[1].close, 50.0);
    }

    #[test]
    fn trade_on_boundary_opens_the_next_bucket() {
        let trades = vec![
            trade(1, ts(10, 59, 59), 100.0, 1.0),
            trade(1, ts(11, 0, 0), 200.0, 1.0),
        ];
        let candles = ohlcv_resample_trades(&trades, &hourly());
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, ts(10, 0, 0));
        assert_eq!(candles[1].timestamp, ts(11, 0, 0));
        assert_eq!(candles[1].open, 200.0);
    }

    #[test]
    fn chain_extension_columns_span_the_bucket() {
        let trades = vec![
            Trade {
                block_number: Some(1005),
                exchange_rate: Some(0.97),
                ..trade(1, ts(10, 1, 0), 100.0, 1.0)
            },
            Trade {
                // Reorged delivery: earlier block arrives later in the bucket.
                block_number: Some(1002),
                exchange_rate: Some(0.99),
                ..trade(1, ts(10, 30, 0), 101.0, 1.0)
            },
        ];
        let candles = ohlcv_resample_trades(&trades, &hourly());
        assert_eq!(candles.len(), 1);
        assert_eq!(candles[0].start_block, Some(1002));
        assert_eq!(candles[0].end_block, Some(1005));
        assert_eq!(candles[0].exchange_rate, Some(0.99));
    }

    #[test]
    fn get_feed_for_pair_filters_in_order() {
        let trades = vec![
            trade(1, ts(10, 5, 0), 100.0, 1.0),
            trade(2, ts(10, 6, 0), 50.0, 1.0),
            trade(1, ts(11, 7, 0), 102.0, 1.0),
        ];
        let table = ohlcv_resample_trades(&trades, &hourly());

        let pair_1 = get_feed_for_pair(&table, 1);
        assert_eq!(pair_1.len(), 2);
        assert!(pair_1.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert!(pair_1.iter().all(|c| c.pair_id == 1));
    }

    #[test]
    fn get_feed_for_absent_pair_is_empty() {
        let table = ohlcv_resample_trades(&[trade(1, ts(10, 5, 0), 100.0, 1.0)], &hourly());
        assert!(get_feed_for_pair(&table, 99).is_empty());
    }
}
