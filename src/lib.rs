//! In-memory OHLCV candle engine: grouped candle storage with tolerant
//! point-in-time price lookup, and incremental candle aggregation from a
//! raw trade stream with correction (delta) support.
//!
//! Data flows raw trades → [`Timeframe`] bucketing →
//! [`ohlcv_resample_trades`] → [`CandleFeed`]'s owned table; batch or
//! historical snapshots go through [`GroupedCandleUniverse`], whose
//! queries never expose a bar before its close would have been knowable.
//!
//! Everything here is synchronous, in-memory computation. Fetching,
//! persistence and transport belong to the collaborators that hand this
//! crate its trade and candle tables.

pub mod candle;
pub mod error;
pub mod feed;
pub mod resample;
pub mod timeframe;
pub mod trade;
pub mod universe;

pub use candle::{Candle, PairId};
pub use error::{FeedError, TimeframeError, UniverseError};
pub use feed::CandleFeed;
pub use resample::{get_feed_for_pair, ohlcv_resample_trades};
pub use timeframe::Timeframe;
pub use trade::{Trade, TradeDelta, TradeFeed};
pub use universe::GroupedCandleUniverse;
