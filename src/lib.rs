// Market Sentinel - Streaming OHLCV aggregation and anomaly detection
//
// A trade stream is folded per symbol into fixed-interval OHLCV candles;
// every closed candle is appended to a bounded history that three
// detection rules (price movement, volume spike, SMA divergence) evaluate.
// Candles go to a pluggable store, anomalies to a pluggable alert sink.

pub mod aggregator;
pub mod core;
pub mod detector;
pub mod feed;
pub mod pipeline;
