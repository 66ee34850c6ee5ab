// Alert Delivery - Sink interface, human-readable formatting, and the two
// in-process sink implementations

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use crate::core::events::{AlertBus, AlertEvent};
use crate::core::types::{AnomalyDetails, AnomalyRecord};

#[derive(Debug, Error)]
pub enum AlertError {
    #[error("alert delivery failed: {0}")]
    DeliveryFailed(String),
}

/// Contract the pipeline needs from alert delivery. Records are handed over
/// read-only; deduplication across detections is the receiver's business.
pub trait AlertSink: Send + Sync {
    fn deliver(&self, record: &AnomalyRecord) -> Result<(), AlertError>;
}

/// Render the per-kind alert body with measured values and threshold.
pub fn format_alert(record: &AnomalyRecord) -> String {
    let when = Utc
        .timestamp_millis_opt(record.interval_start)
        .single()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| record.interval_start.to_string());

    match &record.details {
        AnomalyDetails::PriceMovement {
            current_close,
            previous_close,
            change_pct,
            threshold_pct,
        } => format!(
            "PRICE MOVEMENT ALERT | symbol={} change={:+.2}% current={:.2} previous={:.2} threshold={}% severity={} time={}",
            record.symbol, change_pct, current_close, previous_close, threshold_pct,
            record.severity, when
        ),
        AnomalyDetails::VolumeSpike {
            current_volume,
            average_volume,
            ratio,
            threshold,
        } => format!(
            "VOLUME SPIKE ALERT | symbol={} ratio={:.2}x current={:.2} average={:.2} threshold={}x severity={} time={}",
            record.symbol, ratio, current_volume, average_volume, threshold,
            record.severity, when
        ),
        AnomalyDetails::SmaDivergence {
            current_close,
            short_sma,
            long_sma,
            divergence_pct,
            threshold_pct,
        } => format!(
            "SMA DIVERGENCE ALERT | symbol={} divergence={:+.2}% short={:.2} long={:.2} close={:.2} threshold={}% severity={} time={}",
            record.symbol, divergence_pct, short_sma, long_sma, current_close,
            threshold_pct, record.severity, when
        ),
    }
}

/// Sink that logs each alert through tracing at warn level.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn deliver(&self, record: &AnomalyRecord) -> Result<(), AlertError> {
        warn!(
            kind = %record.kind(),
            symbol = %record.symbol,
            severity = %record.severity,
            "{}",
            format_alert(record)
        );
        Ok(())
    }
}

/// Sink that publishes each alert onto an `AlertBus`, stamped with the
/// publish time supplied by the caller-provided clock.
pub struct BusAlertSink {
    bus: Arc<AlertBus>,
    clock: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl BusAlertSink {
    pub fn new(bus: Arc<AlertBus>) -> Self {
        Self {
            bus,
            clock: Box::new(|| Utc::now().timestamp_millis()),
        }
    }

    /// Replace the wall clock, for deterministic tests.
    pub fn with_clock<F>(bus: Arc<AlertBus>, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        Self {
            bus,
            clock: Box::new(clock),
        }
    }
}

impl AlertSink for BusAlertSink {
    fn deliver(&self, record: &AnomalyRecord) -> Result<(), AlertError> {
        let event = AlertEvent::new(record.clone(), (self.clock)());
        self.bus.publish(event);
        Ok(())
    }
}

/// Fans one record out to several sinks; the first failure wins.
pub struct MultiSink {
    sinks: Vec<Box<dyn AlertSink>>,
}

impl MultiSink {
    pub fn new(sinks: Vec<Box<dyn AlertSink>>) -> Self {
        Self { sinks }
    }
}

impl AlertSink for MultiSink {
    fn deliver(&self, record: &AnomalyRecord) -> Result<(), AlertError> {
        for sink in &self.sinks {
            sink.deliver(record)?;
        }
        Ok(())
    }
}
