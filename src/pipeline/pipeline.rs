// Sentinel Pipeline - Wires trade events through aggregation, history,
// detection, persistence, and alert delivery, one state per symbol

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::aggregator::{CandleHistory, OhlcvAggregator, TradeRejection};
use crate::core::config::SentinelConfig;
use crate::core::types::{Candle, TradeEvent};
use crate::detector::AnomalyDetector;

use super::alerts::AlertSink;
use super::store::CandleStore;

/// Per-symbol aggregation state: the OHLCV fold plus the detection window.
/// Created on first trade for a symbol, kept for the pipeline's lifetime.
struct SymbolState {
    aggregator: OhlcvAggregator,
    history: CandleHistory,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub trades_processed: u64,
    pub trades_rejected_malformed: u64,
    pub trades_rejected_late: u64,
    pub candles_closed: u64,
    pub anomalies_detected: u64,
    pub alert_failures: u64,
    pub symbol_count: usize,
}

impl fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pipeline(symbols={}, trades={}, candles={}, anomalies={}, rejected_late={}, rejected_malformed={})",
            self.symbol_count,
            self.trades_processed,
            self.candles_closed,
            self.anomalies_detected,
            self.trades_rejected_late,
            self.trades_rejected_malformed
        )
    }
}

/// Drives the core against its collaborators.
///
/// The pipeline owns every symbol's mutable state and is itself mutated by
/// a single caller at a time, which gives the aggregator the per-symbol
/// serialization it requires. Distinct pipelines (or shards of symbols)
/// can run fully in parallel.
pub struct SentinelPipeline {
    config: SentinelConfig,
    detector: AnomalyDetector,
    symbols: HashMap<String, SymbolState>,
    store: Box<dyn CandleStore>,
    alerts: Box<dyn AlertSink>,
    stats: PipelineStats,
}

impl SentinelPipeline {
    pub fn new(
        config: SentinelConfig,
        store: Box<dyn CandleStore>,
        alerts: Box<dyn AlertSink>,
    ) -> Self {
        info!(
            interval_minutes = config.aggregator.interval_minutes,
            history_window = config.detector.history_window,
            "Creating sentinel pipeline"
        );
        let detector = AnomalyDetector::new(config.detector.clone());
        Self {
            config,
            detector,
            symbols: HashMap::new(),
            store,
            alerts,
            stats: PipelineStats::default(),
        }
    }

    /// Feed one trade through the pipeline. A closed candle triggers
    /// persistence, history append, and detection; the rejection variants
    /// are counted and surfaced to the caller unchanged.
    pub fn process_trade(&mut self, trade: &TradeEvent) -> Result<(), TradeRejection> {
        let interval_ms = self.config.aggregator.interval_ms();
        let history_window = self.config.detector.history_window;

        let state = self
            .symbols
            .entry(trade.symbol.clone())
            .or_insert_with(|| {
                debug!(symbol = %trade.symbol, "First trade for symbol, creating state");
                SymbolState {
                    aggregator: OhlcvAggregator::new(trade.symbol.clone(), interval_ms),
                    history: CandleHistory::new(history_window),
                }
            });

        let closed = match state.aggregator.process_trade(trade) {
            Ok(closed) => closed,
            Err(rejection) => {
                match rejection {
                    TradeRejection::Malformed(_) => self.stats.trades_rejected_malformed += 1,
                    TradeRejection::LateEvent { .. } => self.stats.trades_rejected_late += 1,
                }
                return Err(rejection);
            }
        };

        self.stats.trades_processed += 1;
        if let Some(candle) = closed {
            self.on_candle_closed(&trade.symbol, candle);
        }
        Ok(())
    }

    /// Close every symbol's open interval, running the same persistence and
    /// detection path as a natural rollover. Call on stream pause or end.
    pub fn flush_all(&mut self) -> usize {
        let mut flushed = Vec::new();
        for (symbol, state) in self.symbols.iter_mut() {
            if let Some(candle) = state.aggregator.flush() {
                flushed.push((symbol.clone(), candle));
            }
        }
        let count = flushed.len();
        for (symbol, candle) in flushed {
            self.on_candle_closed(&symbol, candle);
        }
        if count > 0 {
            info!(count, "Flushed open intervals");
        }
        count
    }

    fn on_candle_closed(&mut self, symbol: &str, candle: Candle) {
        self.stats.candles_closed += 1;

        if let Err(e) = self.store.put_candle(&candle) {
            // The core does not retry persistence; record and move on.
            warn!(symbol, error = %e, "Candle persistence failed");
        }

        let state = match self.symbols.get_mut(symbol) {
            Some(state) => state,
            None => return,
        };
        state.history.push(candle);

        let anomalies = self.detector.detect(&state.history);
        self.stats.anomalies_detected += anomalies.len() as u64;

        for record in &anomalies {
            if let Err(e) = self.alerts.deliver(record) {
                self.stats.alert_failures += 1;
                warn!(symbol, error = %e, "Alert delivery failed");
            }
        }
    }

    pub fn stats(&self) -> PipelineStats {
        let mut stats = self.stats.clone();
        stats.symbol_count = self.symbols.len();
        stats
    }

    pub fn store(&self) -> &dyn CandleStore {
        self.store.as_ref()
    }

    pub fn tracked_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.symbols.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Completed-candle count currently held for a symbol.
    pub fn history_len(&self, symbol: &str) -> usize {
        self.symbols.get(symbol).map_or(0, |s| s.history.len())
    }
}
