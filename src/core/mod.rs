// Core Module - Foundational types, config, logging, alert bus

pub mod config;
pub mod events;
pub mod logger;
pub mod types;

// Re-export commonly used items for convenience
pub use config::{
    AggregatorConfig, ConfigError, DetectorConfig, MonitoringConfig, SentinelConfig,
};
pub use events::{AlertBus, AlertBusSnapshot, AlertEvent};
pub use logger::setup_logging;
pub use types::{AnomalyDetails, AnomalyKind, AnomalyRecord, Candle, Severity, TradeEvent};
