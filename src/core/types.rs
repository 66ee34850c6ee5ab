// Core Type Definitions for Market Sentinel
// Trade events, OHLCV candles, and anomaly records

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// TradeEvent
// ============================================================================

/// One observed trade, attributed to a symbol.
/// `event_time` is the authoritative trade time in epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub symbol: String,
    pub price: f64,
    pub quantity: f64,
    pub event_time: i64,
}

impl TradeEvent {
    pub fn new(symbol: String, price: f64, quantity: f64, event_time: i64) -> Self {
        Self {
            symbol,
            price,
            quantity,
            event_time,
        }
    }

    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TradeEvent(symbol={}, price={:.2}, qty={:.4}, time={})",
            self.symbol, self.price, self.quantity, self.event_time
        )
    }
}

// ============================================================================
// Candle (OHLCV)
// ============================================================================

/// OHLCV summary of one closed interval for one symbol.
/// Immutable once emitted by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub interval_start: i64, // epoch millis, aligned to interval granularity
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub trade_count: u64,
}

impl Candle {
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

impl fmt::Display for Candle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Candle(symbol={}, start={}, O={:.2}, H={:.2}, L={:.2}, C={:.2}, V={:.4}, n={})",
            self.symbol,
            self.interval_start,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume,
            self.trade_count
        )
    }
}

// ============================================================================
// Anomaly Records
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    PriceMovement,
    VolumeSpike,
    SmaDivergence,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::PriceMovement => write!(f, "price_movement"),
            AnomalyKind::VolumeSpike => write!(f, "volume_spike"),
            AnomalyKind::SmaDivergence => write!(f, "sma_divergence"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
        }
    }
}

/// Rule-specific measurements carried by an anomaly record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum AnomalyDetails {
    PriceMovement {
        current_close: f64,
        previous_close: f64,
        change_pct: f64,
        threshold_pct: f64,
    },
    VolumeSpike {
        current_volume: f64,
        average_volume: f64,
        ratio: f64,
        threshold: f64,
    },
    SmaDivergence {
        current_close: f64,
        short_sma: f64,
        long_sma: f64,
        divergence_pct: f64,
        threshold_pct: f64,
    },
}

/// One rule firing against one candle.
///
/// Carries no random identifiers: detecting twice against the same history
/// produces field-for-field identical records. Delivery envelopes add ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnomalyRecord {
    pub symbol: String,
    pub severity: Severity,
    pub interval_start: i64, // the triggering candle's interval_start
    pub details: AnomalyDetails,
}

impl AnomalyRecord {
    pub fn kind(&self) -> AnomalyKind {
        match self.details {
            AnomalyDetails::PriceMovement { .. } => AnomalyKind::PriceMovement,
            AnomalyDetails::VolumeSpike { .. } => AnomalyKind::VolumeSpike,
            AnomalyDetails::SmaDivergence { .. } => AnomalyKind::SmaDivergence,
        }
    }
}

impl fmt::Display for AnomalyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnomalyRecord(kind={}, symbol={}, severity={}, start={})",
            self.kind(),
            self.symbol,
            self.severity,
            self.interval_start
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            symbol: "BTCUSDT".to_string(),
            interval_start: 1_700_000_040_000,
            open,
            high,
            low,
            close,
            volume: 12.5,
            trade_count: 42,
        }
    }

    #[test]
    fn test_trade_event_notional() {
        let trade = TradeEvent::new("BTCUSDT".to_string(), 50_000.0, 0.5, 1_700_000_000_000);
        assert_eq!(trade.notional(), 25_000.0);
    }

    #[test]
    fn test_candle_direction() {
        assert!(make_candle(100.0, 120.0, 90.0, 110.0).is_bullish());
        assert!(make_candle(110.0, 120.0, 90.0, 100.0).is_bearish());
        let flat = make_candle(100.0, 120.0, 90.0, 100.0);
        assert!(!flat.is_bullish() && !flat.is_bearish());
    }

    #[test]
    fn test_candle_range() {
        assert_eq!(make_candle(100.0, 120.0, 90.0, 110.0).range(), 30.0);
    }

    #[test]
    fn test_anomaly_kind_from_details() {
        let record = AnomalyRecord {
            symbol: "BTCUSDT".to_string(),
            severity: Severity::Medium,
            interval_start: 0,
            details: AnomalyDetails::VolumeSpike {
                current_volume: 50.0,
                average_volume: 10.0,
                ratio: 5.0,
                threshold: 3.0,
            },
        };
        assert_eq!(record.kind(), AnomalyKind::VolumeSpike);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn test_display_traits() {
        assert_eq!(format!("{}", AnomalyKind::PriceMovement), "price_movement");
        assert_eq!(format!("{}", Severity::High), "HIGH");
    }

    #[test]
    fn test_anomaly_record_serde_roundtrip() {
        let record = AnomalyRecord {
            symbol: "ETHUSDT".to_string(),
            severity: Severity::High,
            interval_start: 1_700_000_040_000,
            details: AnomalyDetails::PriceMovement {
                current_close: 100.0,
                previous_close: 110.0,
                change_pct: -9.09,
                threshold_pct: 5.0,
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"rule\":\"price_movement\""));
        let back: AnomalyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
