// SMA-Divergence Rule - Short (10) vs long (20) simple moving average of
// closing prices

use crate::aggregator::CandleHistory;
use crate::core::types::{AnomalyDetails, AnomalyRecord};

use super::severity_for;

const MIN_HISTORY: usize = 25;
const SHORT_PERIOD: usize = 10;
const LONG_PERIOD: usize = 20;

/// Fires when the short SMA diverges from the long SMA by more than
/// `threshold_pct` percent of the long SMA. Requires 25 candles so both
/// averages sit inside a fully warmed window; abstains when the long SMA
/// is zero.
pub fn evaluate(history: &CandleHistory, threshold_pct: f64) -> Option<AnomalyRecord> {
    if history.len() < MIN_HISTORY {
        return None;
    }

    let current = history.get(0)?;
    let short_sma = history.sma_close(SHORT_PERIOD)?;
    let long_sma = history.sma_close(LONG_PERIOD)?;

    if long_sma == 0.0 {
        return None;
    }

    let divergence_pct = (short_sma - long_sma) / long_sma * 100.0;
    if divergence_pct.abs() <= threshold_pct {
        return None;
    }

    Some(AnomalyRecord {
        symbol: current.symbol.clone(),
        severity: severity_for(divergence_pct.abs(), threshold_pct),
        interval_start: current.interval_start,
        details: AnomalyDetails::SmaDivergence {
            current_close: current.close,
            short_sma,
            long_sma,
            divergence_pct,
            threshold_pct,
        },
    })
}
