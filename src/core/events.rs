// Alert Bus for Market Sentinel
// In-process pub/sub fan-out for anomaly alerts using tokio channels

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::core::types::{AnomalyRecord, Severity};

// ============================================================================
// Alert Envelope
// ============================================================================

/// Delivery envelope around an anomaly record. The envelope owns the
/// randomly assigned `alert_id`; the record itself stays deterministic.
#[derive(Debug, Clone, Serialize)]
pub struct AlertEvent {
    pub alert_id: String,
    pub published_at: i64, // epoch millis
    pub record: AnomalyRecord,
}

impl AlertEvent {
    pub fn new(record: AnomalyRecord, published_at: i64) -> Self {
        Self {
            alert_id: Uuid::new_v4().to_string(),
            published_at,
            record,
        }
    }

    pub fn severity(&self) -> Severity {
        self.record.severity
    }
}

impl fmt::Display for AlertEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AlertEvent(id={}, kind={}, symbol={}, severity={})",
            &self.alert_id[..8],
            self.record.kind(),
            self.record.symbol,
            self.record.severity
        )
    }
}

// ============================================================================
// Alert Bus
// ============================================================================

type AlertCallback = Arc<dyn Fn(AlertEvent) + Send + Sync>;

#[derive(Debug, Clone, Default)]
struct AlertBusStats {
    total_published: u64,
    total_delivered: u64,
}

/// Fan-out channel for anomaly alerts. Constructed by the caller and passed
/// where needed; there is deliberately no process-wide instance.
pub struct AlertBus {
    tx: broadcast::Sender<AlertEvent>,
    subscribers: RwLock<Vec<AlertCallback>>,
    history: RwLock<VecDeque<AlertEvent>>,
    max_history: usize,
    stats: RwLock<AlertBusStats>,
}

impl AlertBus {
    pub fn new(max_history: usize) -> Self {
        let (tx, _rx) = broadcast::channel(1024);
        Self {
            tx,
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(VecDeque::with_capacity(max_history.min(1024))),
            max_history,
            stats: RwLock::new(AlertBusStats::default()),
        }
    }

    /// Register a synchronous callback invoked for every published alert.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(AlertEvent) + Send + Sync + 'static,
    {
        self.subscribers.write().push(Arc::new(callback));
        tracing::debug!("Alert subscriber registered");
    }

    /// Get a receiver on the broadcast channel for async consumers.
    pub fn subscribe_channel(&self) -> broadcast::Receiver<AlertEvent> {
        self.tx.subscribe()
    }

    /// Publish an alert to all subscribers and the history buffer.
    pub fn publish(&self, event: AlertEvent) {
        self.stats.write().total_published += 1;

        {
            let mut history = self.history.write();
            history.push_back(event.clone());
            if history.len() > self.max_history {
                history.pop_front();
            }
        }

        // Channel send fails only when no receiver exists, which is fine.
        let _ = self.tx.send(event.clone());

        let subscribers = self.subscribers.read();
        for callback in subscribers.iter() {
            callback(event.clone());
            self.stats.write().total_delivered += 1;
        }
    }

    /// Most recent alerts, newest last, optionally filtered by symbol.
    pub fn recent_alerts(&self, symbol: Option<&str>, limit: usize) -> Vec<AlertEvent> {
        let history = self.history.read();
        history
            .iter()
            .filter(|e| symbol.map_or(true, |s| e.record.symbol == s))
            .rev()
            .take(limit)
            .cloned()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }

    pub fn snapshot(&self) -> AlertBusSnapshot {
        let stats = self.stats.read();
        AlertBusSnapshot {
            total_published: stats.total_published,
            total_delivered: stats.total_delivered,
            subscriber_count: self.subscribers.read().len(),
            history_size: self.history.read().len(),
        }
    }
}

/// Point-in-time view of bus activity.
#[derive(Debug, Clone)]
pub struct AlertBusSnapshot {
    pub total_published: u64,
    pub total_delivered: u64,
    pub subscriber_count: usize,
    pub history_size: usize,
}
