// Aggregator - Trade stream to fixed-interval OHLCV candles

pub mod history;
pub mod interval;
pub mod ohlcv;

pub use history::CandleHistory;
pub use interval::interval_key;
pub use ohlcv::{AggregatorStats, OhlcvAggregator, TradeRejection};
