// Anomaly Detector - Stateless evaluation of candle history against three
// independent rules

pub mod price_movement;
pub mod sma_divergence;
pub mod volume_spike;

use tracing::debug;

use crate::aggregator::CandleHistory;
use crate::core::config::DetectorConfig;
use crate::core::types::{AnomalyRecord, Severity};

/// Severity doubles with the threshold: beyond twice the configured limit
/// a firing is High, otherwise Medium.
pub(crate) fn severity_for(measured_abs: f64, threshold: f64) -> Severity {
    if measured_abs > threshold * 2.0 {
        Severity::High
    } else {
        Severity::Medium
    }
}

/// Runs every rule against a symbol's candle history.
///
/// Reentrant and side-effect-free: `detect` takes `&self` and a shared
/// history reference, and two calls against an unchanged history return
/// field-for-field identical records.
pub struct AnomalyDetector {
    config: DetectorConfig,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Evaluate all rules, collecting every firing. Rules short on history
    /// simply contribute nothing (warm-up, not failure).
    pub fn detect(&self, history: &CandleHistory) -> Vec<AnomalyRecord> {
        let mut anomalies = Vec::new();

        if let Some(record) =
            price_movement::evaluate(history, self.config.price_threshold_pct)
        {
            anomalies.push(record);
        }
        if let Some(record) = volume_spike::evaluate(history, self.config.volume_threshold) {
            anomalies.push(record);
        }
        if let Some(record) =
            sma_divergence::evaluate(history, self.config.sma_threshold_pct)
        {
            anomalies.push(record);
        }

        if !anomalies.is_empty() {
            debug!(
                count = anomalies.len(),
                symbol = %anomalies[0].symbol,
                "Anomalies detected"
            );
        }
        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{AnomalyKind, Candle};

    fn push_candle(history: &mut CandleHistory, i: i64, close: f64, volume: f64) {
        history.push(Candle {
            symbol: "BTCUSDT".to_string(),
            interval_start: i * 60_000,
            open: close,
            high: close,
            low: close,
            close,
            volume,
            trade_count: 1,
        });
    }

    fn detector() -> AnomalyDetector {
        AnomalyDetector::new(DetectorConfig::default())
    }

    #[test]
    fn test_severity_boundaries() {
        assert_eq!(severity_for(5.1, 5.0), Severity::Medium);
        assert_eq!(severity_for(10.0, 5.0), Severity::Medium); // not strictly above
        assert_eq!(severity_for(10.1, 5.0), Severity::High);
    }

    #[test]
    fn test_empty_history_detects_nothing() {
        let history = CandleHistory::new(60);
        assert!(detector().detect(&history).is_empty());
    }

    #[test]
    fn test_multiple_rules_fire_for_same_candle() {
        let mut history = CandleHistory::new(60);
        // 24 quiet candles at close 100, volume 10
        for i in 0..24 {
            push_candle(&mut history, i, 100.0, 10.0);
        }
        // Latest candle: big price jump and volume spike at once
        push_candle(&mut history, 24, 120.0, 100.0);

        let anomalies = detector().detect(&history);
        let kinds: Vec<AnomalyKind> = anomalies.iter().map(|a| a.kind()).collect();
        assert!(kinds.contains(&AnomalyKind::PriceMovement));
        assert!(kinds.contains(&AnomalyKind::VolumeSpike));
        // short SMA (102) vs long SMA (101): below 2% divergence
        assert!(!kinds.contains(&AnomalyKind::SmaDivergence));

        // Every record points at the triggering candle
        assert!(anomalies.iter().all(|a| a.interval_start == 24 * 60_000));
    }

    #[test]
    fn test_detect_is_idempotent() {
        let mut history = CandleHistory::new(60);
        for i in 0..24 {
            push_candle(&mut history, i, 100.0, 10.0);
        }
        push_candle(&mut history, 24, 120.0, 100.0);

        let det = detector();
        let first = det.detect(&history);
        let second = det.detect(&history);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_warm_up_is_quiet_even_on_wild_data() {
        let mut history = CandleHistory::new(60);
        push_candle(&mut history, 0, 100.0, 1_000_000.0);
        // One candle: every rule is below its minimum history
        assert!(detector().detect(&history).is_empty());
    }

    #[test]
    fn test_custom_thresholds_respected() {
        let mut history = CandleHistory::new(60);
        push_candle(&mut history, 0, 100.0, 10.0);
        push_candle(&mut history, 1, 104.0, 10.0); // +4%

        let strict = AnomalyDetector::new(DetectorConfig {
            price_threshold_pct: 3.0,
            ..DetectorConfig::default()
        });
        let lax = AnomalyDetector::new(DetectorConfig::default());

        assert_eq!(strict.detect(&history).len(), 1);
        assert!(lax.detect(&history).is_empty());
    }
}
