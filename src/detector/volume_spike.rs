// Volume-Spike Rule - Current candle volume against the trailing average

use crate::aggregator::CandleHistory;
use crate::core::types::{AnomalyDetails, AnomalyRecord};

use super::severity_for;

const MIN_HISTORY: usize = 10;
/// Trailing candles averaged, excluding the current one.
const LOOKBACK: usize = 9;

/// Fires when current volume divided by the average of the previous nine
/// candles exceeds `threshold`. A zero average makes the ratio 0, so the
/// rule never fires on a dead market.
pub fn evaluate(history: &CandleHistory, threshold: f64) -> Option<AnomalyRecord> {
    if history.len() < MIN_HISTORY {
        return None;
    }

    let current = history.get(0)?;
    let average_volume = history.mean_volume(1, 1 + LOOKBACK)?;

    let ratio = if average_volume > 0.0 {
        current.volume / average_volume
    } else {
        0.0
    };

    if ratio <= threshold {
        return None;
    }

    Some(AnomalyRecord {
        symbol: current.symbol.clone(),
        severity: severity_for(ratio, threshold),
        interval_start: current.interval_start,
        details: AnomalyDetails::VolumeSpike {
            current_volume: current.volume,
            average_volume,
            ratio,
            threshold,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Candle, Severity};

    fn history_with_volumes(volumes_oldest_first: &[f64]) -> CandleHistory {
        let mut history = CandleHistory::new(64);
        for (i, volume) in volumes_oldest_first.iter().enumerate() {
            history.push(Candle {
                symbol: "BTCUSDT".to_string(),
                interval_start: (i as i64 + 1) * 60_000,
                open: 100.0,
                high: 100.0,
                low: 100.0,
                close: 100.0,
                volume: *volume,
                trade_count: 1,
            });
        }
        history
    }

    #[test]
    fn test_spec_example_fires_medium() {
        // Newest-first volumes: [50, 10 x9] -> avg 10, ratio 5.0
        let mut volumes = vec![10.0; 9];
        volumes.push(50.0);
        let history = history_with_volumes(&volumes);

        let record = evaluate(&history, 3.0).expect("should fire");
        match record.details {
            AnomalyDetails::VolumeSpike {
                current_volume,
                average_volume,
                ratio,
                threshold,
            } => {
                assert_eq!(current_volume, 50.0);
                assert!((average_volume - 10.0).abs() < 1e-12);
                assert!((ratio - 5.0).abs() < 1e-12);
                assert_eq!(threshold, 3.0);
            }
            _ => panic!("wrong details variant"),
        }
        // High needs ratio > 6.0; 5.0 is Medium
        assert_eq!(record.severity, Severity::Medium);
    }

    #[test]
    fn test_high_severity_above_double_threshold() {
        let mut volumes = vec![10.0; 9];
        volumes.push(70.0); // ratio 7.0 > 6.0
        let history = history_with_volumes(&volumes);
        assert_eq!(evaluate(&history, 3.0).unwrap().severity, Severity::High);
    }

    #[test]
    fn test_zero_average_never_fires() {
        let mut volumes = vec![0.0; 9];
        volumes.push(100.0);
        let history = history_with_volumes(&volumes);
        assert!(evaluate(&history, 3.0).is_none());
    }

    #[test]
    fn test_warm_up_abstains() {
        let history = history_with_volumes(&[10.0; 9]);
        assert!(evaluate(&history, 3.0).is_none());
    }

    #[test]
    fn test_average_uses_exactly_nine_trailing_candles() {
        // Eleventh (oldest) candle has a huge volume that must be ignored:
        // only offsets 1..=9 count toward the average.
        let mut volumes = vec![1_000_000.0];
        volumes.extend(vec![10.0; 9]);
        volumes.push(40.0); // ratio 4.0 against avg 10
        let history = history_with_volumes(&volumes);

        let record = evaluate(&history, 3.0).expect("should fire");
        match record.details {
            AnomalyDetails::VolumeSpike { average_volume, .. } => {
                assert!((average_volume - 10.0).abs() < 1e-12);
            }
            _ => panic!("wrong details variant"),
        }
    }

    #[test]
    fn test_below_threshold_is_silent() {
        let mut volumes = vec![10.0; 9];
        volumes.push(25.0); // ratio 2.5
        let history = history_with_volumes(&volumes);
        assert!(evaluate(&history, 3.0).is_none());
    }
}
