// OHLCV Aggregator - Folds a per-symbol trade stream into interval candles
// One candle emitted exactly when its time bucket closes

use thiserror::Error;
use tracing::{debug, warn};

use crate::core::types::{Candle, TradeEvent};

use super::interval::interval_key;

// ============================================================================
// Rejection Type
// ============================================================================

/// A trade the aggregator refused to fold. Rejections never mutate the
/// open interval.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TradeRejection {
    #[error("malformed trade: {0}")]
    Malformed(String),
    /// The trade's interval key is behind the currently open interval.
    #[error("late trade: event interval {event_interval} < open interval {open_interval}")]
    LateEvent {
        event_interval: i64,
        open_interval: i64,
    },
}

// ============================================================================
// Aggregator
// ============================================================================

/// The in-progress interval. Materialized into a `Candle` on rollover or
/// flush, then discarded.
#[derive(Debug, Clone, PartialEq)]
struct OpenInterval {
    interval_start: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
    trade_count: u64,
}

impl OpenInterval {
    fn seed(interval_start: i64, trade: &TradeEvent) -> Self {
        Self {
            interval_start,
            open: trade.price,
            high: trade.price,
            low: trade.price,
            close: trade.price,
            volume: trade.quantity,
            trade_count: 1,
        }
    }

    fn fold(&mut self, trade: &TradeEvent) {
        self.high = self.high.max(trade.price);
        self.low = self.low.min(trade.price);
        self.close = trade.price;
        self.volume += trade.quantity;
        self.trade_count += 1;
    }

    fn materialize(self, symbol: &str) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            interval_start: self.interval_start,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
            trade_count: self.trade_count,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregatorStats {
    pub trades_processed: u64,
    pub candles_emitted: u64,
    pub rejected_malformed: u64,
    pub rejected_late: u64,
}

/// Per-symbol OHLCV aggregator. One instance per symbol, mutated by a
/// single caller at a time; cross-symbol parallelism is the pipeline's job.
pub struct OhlcvAggregator {
    symbol: String,
    interval_ms: i64,
    current: Option<OpenInterval>,
    stats: AggregatorStats,
}

impl OhlcvAggregator {
    pub fn new(symbol: String, interval_ms: i64) -> Self {
        assert!(interval_ms > 0, "interval width must be positive");
        Self {
            symbol,
            interval_ms,
            current: None,
            stats: AggregatorStats::default(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn interval_ms(&self) -> i64 {
        self.interval_ms
    }

    /// Fold one trade into the running interval.
    ///
    /// Returns `Ok(Some(candle))` exactly when the trade opens a later
    /// bucket, closing the previous one. Malformed and late trades are
    /// rejected without touching the open interval.
    pub fn process_trade(
        &mut self,
        trade: &TradeEvent,
    ) -> Result<Option<Candle>, TradeRejection> {
        self.validate(trade)?;

        let key = interval_key(trade.event_time, self.interval_ms);

        let closed = match self.current.take() {
            None => {
                self.current = Some(OpenInterval::seed(key, trade));
                None
            }
            Some(mut open) if key == open.interval_start => {
                open.fold(trade);
                self.current = Some(open);
                None
            }
            Some(open) if key > open.interval_start => {
                self.current = Some(OpenInterval::seed(key, trade));
                Some(open.materialize(&self.symbol))
            }
            Some(open) => {
                let open_interval = open.interval_start;
                self.current = Some(open);
                self.stats.rejected_late += 1;
                warn!(
                    symbol = %self.symbol,
                    event_interval = key,
                    open_interval,
                    "Rejecting late trade"
                );
                return Err(TradeRejection::LateEvent {
                    event_interval: key,
                    open_interval,
                });
            }
        };

        self.stats.trades_processed += 1;
        if let Some(candle) = &closed {
            self.stats.candles_emitted += 1;
            debug!(symbol = %self.symbol, candle = %candle, "Interval closed");
        }
        Ok(closed)
    }

    /// Materialize the open interval without opening a new one. The next
    /// trade starts fresh. Used when the source stream pauses or ends so
    /// the last partial interval is not lost.
    pub fn flush(&mut self) -> Option<Candle> {
        let candle = self
            .current
            .take()
            .map(|interval| interval.materialize(&self.symbol));
        if let Some(candle) = &candle {
            self.stats.candles_emitted += 1;
            debug!(symbol = %self.symbol, candle = %candle, "Flushed open interval");
        }
        candle
    }

    /// Whether an interval is currently accumulating.
    pub fn has_open_interval(&self) -> bool {
        self.current.is_some()
    }

    pub fn stats(&self) -> AggregatorStats {
        self.stats
    }

    fn validate(&mut self, trade: &TradeEvent) -> Result<(), TradeRejection> {
        let reason = if !trade.price.is_finite() || trade.price < 0.0 {
            Some(format!("price {} out of domain", trade.price))
        } else if !trade.quantity.is_finite() || trade.quantity < 0.0 {
            Some(format!("quantity {} out of domain", trade.quantity))
        } else if trade.event_time <= 0 {
            Some(format!("event_time {} not a valid timestamp", trade.event_time))
        } else {
            None
        };

        if let Some(reason) = reason {
            self.stats.rejected_malformed += 1;
            warn!(symbol = %self.symbol, reason = %reason, "Rejecting malformed trade");
            return Err(TradeRejection::Malformed(reason));
        }
        Ok(())
    }
}
