// Candle History - Bounded most-recent-first window of completed candles
// Sized to the longest detection-rule lookback

use std::collections::VecDeque;

use crate::core::types::Candle;

/// Per-symbol window of completed candles, newest at index 0.
/// Appending past the bound evicts the oldest entry, so memory stays
/// bounded no matter how far detection lags behind candle production.
pub struct CandleHistory {
    candles: VecDeque<Candle>,
    max_len: usize,
}

impl CandleHistory {
    pub fn new(max_len: usize) -> Self {
        Self {
            candles: VecDeque::with_capacity(max_len.min(1024)),
            max_len,
        }
    }

    /// Append a freshly closed candle as the new most-recent entry.
    pub fn push(&mut self, candle: Candle) {
        if self.candles.len() >= self.max_len {
            self.candles.pop_back();
        }
        self.candles.push_front(candle);
    }

    /// Candle at offset `idx` from the most recent (0 = newest).
    pub fn get(&self, idx: usize) -> Option<&Candle> {
        self.candles.get(idx)
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.front()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Iterate newest-first.
    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.candles.iter()
    }

    /// Mean of closes over the `period` most recent candles, or None when
    /// the window is shorter than `period`.
    pub fn sma_close(&self, period: usize) -> Option<f64> {
        if period == 0 || self.candles.len() < period {
            return None;
        }
        let sum: f64 = self.candles.iter().take(period).map(|c| c.close).sum();
        Some(sum / period as f64)
    }

    /// Mean volume over candles at offsets `[from, to)` from the newest.
    pub fn mean_volume(&self, from: usize, to: usize) -> Option<f64> {
        if from >= to || self.candles.len() < to {
            return None;
        }
        let count = (to - from) as f64;
        let sum: f64 = self
            .candles
            .iter()
            .skip(from)
            .take(to - from)
            .map(|c| c.volume)
            .sum();
        Some(sum / count)
    }
}
