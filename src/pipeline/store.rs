// Candle Store - Persistence collaborator interface and in-memory impl
// Keyed by (symbol, interval_start); reads come back most-recent-first

use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

use crate::core::types::Candle;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Contract the pipeline needs from candle persistence. The core hands each
/// closed candle over read-only and does not retry or verify writes.
pub trait CandleStore: Send + Sync {
    fn put_candle(&self, candle: &Candle) -> Result<(), StoreError>;

    /// Most recent `limit` candles for a symbol, newest first.
    fn recent(&self, symbol: &str, limit: usize) -> Vec<Candle>;

    fn symbols(&self) -> Vec<String>;

    fn candle_count(&self) -> usize;
}

/// In-memory store for tests and the replay driver. A write to an existing
/// (symbol, interval_start) key overwrites, matching upsert semantics of
/// the durable stores this stands in for.
pub struct MemoryCandleStore {
    by_symbol: RwLock<HashMap<String, BTreeMap<i64, Candle>>>,
}

impl MemoryCandleStore {
    pub fn new() -> Self {
        Self {
            by_symbol: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCandleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CandleStore for MemoryCandleStore {
    fn put_candle(&self, candle: &Candle) -> Result<(), StoreError> {
        self.by_symbol
            .write()
            .entry(candle.symbol.clone())
            .or_default()
            .insert(candle.interval_start, candle.clone());
        Ok(())
    }

    fn recent(&self, symbol: &str, limit: usize) -> Vec<Candle> {
        let guard = self.by_symbol.read();
        match guard.get(symbol) {
            Some(candles) => candles.values().rev().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.by_symbol.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    fn candle_count(&self) -> usize {
        self.by_symbol.read().values().map(|m| m.len()).sum()
    }
}

impl fmt::Display for MemoryCandleStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MemoryCandleStore(symbols={}, candles={})",
            self.by_symbol.read().len(),
            self.candle_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(symbol: &str, interval_start: i64, close: f64) -> Candle {
        Candle {
            symbol: symbol.to_string(),
            interval_start,
            open: close,
            high: close,
            low: close,
            close,
            volume: 1.0,
            trade_count: 1,
        }
    }

    #[test]
    fn test_recent_returns_newest_first() {
        let store = MemoryCandleStore::new();
        for i in 0..5 {
            store.put_candle(&candle("BTCUSDT", i * 60_000, 100.0 + i as f64)).unwrap();
        }

        let recent = store.recent("BTCUSDT", 3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].interval_start, 4 * 60_000);
        assert_eq!(recent[2].interval_start, 2 * 60_000);
    }

    #[test]
    fn test_same_key_overwrites() {
        let store = MemoryCandleStore::new();
        store.put_candle(&candle("BTCUSDT", 60_000, 100.0)).unwrap();
        store.put_candle(&candle("BTCUSDT", 60_000, 105.0)).unwrap();

        assert_eq!(store.candle_count(), 1);
        assert_eq!(store.recent("BTCUSDT", 1)[0].close, 105.0);
    }

    #[test]
    fn test_symbols_are_isolated() {
        let store = MemoryCandleStore::new();
        store.put_candle(&candle("BTCUSDT", 60_000, 100.0)).unwrap();
        store.put_candle(&candle("ETHUSDT", 60_000, 3_000.0)).unwrap();

        assert_eq!(store.symbols(), vec!["BTCUSDT", "ETHUSDT"]);
        assert_eq!(store.recent("BTCUSDT", 10).len(), 1);
        assert_eq!(store.recent("DOGEUSDT", 10).len(), 0);
        assert_eq!(store.candle_count(), 2);
    }
}
