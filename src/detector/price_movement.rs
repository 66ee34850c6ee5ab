// Price-Movement Rule - Close-to-close percentage move between the two
// most recent candles

use crate::aggregator::CandleHistory;
use crate::core::types::{AnomalyDetails, AnomalyRecord};

use super::severity_for;

const MIN_HISTORY: usize = 2;

/// Fires when the absolute close-to-close change exceeds `threshold_pct`.
/// Abstains below two candles of history (warm-up) and when the previous
/// close is zero (degenerate denominator).
pub fn evaluate(history: &CandleHistory, threshold_pct: f64) -> Option<AnomalyRecord> {
    if history.len() < MIN_HISTORY {
        return None;
    }

    let current = history.get(0)?;
    let previous = history.get(1)?;

    if previous.close == 0.0 {
        return None;
    }

    let change_pct = (current.close - previous.close) / previous.close * 100.0;
    if change_pct.abs() <= threshold_pct {
        return None;
    }

    Some(AnomalyRecord {
        symbol: current.symbol.clone(),
        severity: severity_for(change_pct.abs(), threshold_pct),
        interval_start: current.interval_start,
        details: AnomalyDetails::PriceMovement {
            current_close: current.close,
            previous_close: previous.close,
            change_pct,
            threshold_pct,
        },
    })
}
