// Configuration Management for Market Sentinel
// Explicit config structs passed into constructors - no global singletons

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

/// Candle aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Candle bucket width in minutes.
    pub interval_minutes: u32,
}

impl AggregatorConfig {
    pub fn interval_ms(&self) -> i64 {
        self.interval_minutes as i64 * 60_000
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self { interval_minutes: 1 }
    }
}

/// Anomaly detection thresholds and lookback window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Absolute close-to-close move (percent) that fires the price rule.
    pub price_threshold_pct: f64,
    /// Current-volume / average-volume ratio that fires the volume rule.
    pub volume_threshold: f64,
    /// Absolute short/long SMA divergence (percent) that fires the SMA rule.
    pub sma_threshold_pct: f64,
    /// Completed candles retained per symbol. Must cover the longest
    /// rule lookback (25 candles for SMA divergence).
    pub history_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            price_threshold_pct: 5.0,
            volume_threshold: 3.0,
            sma_threshold_pct: 2.0,
            history_window: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
    /// Alerts kept in the bus history buffer.
    pub alert_history_size: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_logs: false,
            alert_history_size: 1000,
        }
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SentinelConfig {
    pub aggregator: AggregatorConfig,
    pub detector: DetectorConfig,
    pub monitoring: MonitoringConfig,
}

impl SentinelConfig {
    /// Build a config from defaults, an optional JSON file, then env overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            config.merge_from_file(path)?;
        }
        config.apply_env();

        info!(
            interval_minutes = config.aggregator.interval_minutes,
            price_threshold = config.detector.price_threshold_pct,
            volume_threshold = config.detector.volume_threshold,
            sma_threshold = config.detector.sma_threshold_pct,
            history_window = config.detector.history_window,
            "Configuration initialized"
        );
        Ok(config)
    }

    /// Merge recognized sections from a JSON config file.
    /// A missing file is tolerated; malformed JSON is not.
    pub fn merge_from_file(&mut self, config_path: &str) -> Result<(), ConfigError> {
        let path = Path::new(config_path);
        if !path.exists() {
            warn!(path = config_path, "Config file not found, using defaults");
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        self.merge_from_json(&content)?;
        info!(path = config_path, "Configuration loaded");
        Ok(())
    }

    /// Merge recognized sections from a JSON document.
    pub fn merge_from_json(&mut self, content: &str) -> Result<(), ConfigError> {
        let sections: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;

        if let Some(value) = sections.get("aggregator") {
            self.aggregator = serde_json::from_value(value.clone())?;
        }
        if let Some(value) = sections.get("detector") {
            self.detector = serde_json::from_value(value.clone())?;
        }
        if let Some(value) = sections.get("monitoring") {
            self.monitoring = serde_json::from_value(value.clone())?;
        }
        Ok(())
    }

    /// Override individual settings from environment variables.
    pub fn apply_env(&mut self) {
        if let Some(v) = env_f64("PRICE_THRESHOLD") {
            self.detector.price_threshold_pct = v;
        }
        if let Some(v) = env_f64("VOLUME_THRESHOLD") {
            self.detector.volume_threshold = v;
        }
        if let Some(v) = env_f64("SMA_THRESHOLD") {
            self.detector.sma_threshold_pct = v;
        }
        if let Ok(raw) = std::env::var("CANDLE_INTERVAL_MINUTES") {
            match raw.parse::<u32>() {
                Ok(v) => self.aggregator.interval_minutes = v,
                Err(_) => warn!(value = %raw, "Ignoring invalid CANDLE_INTERVAL_MINUTES"),
            }
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            self.monitoring.log_level = v;
        }
    }

    /// Validate ranges. Returns every violation at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.aggregator.interval_minutes < 1 {
            errors.push("interval_minutes must be at least 1".to_string());
        }
        if self.detector.price_threshold_pct <= 0.0 {
            errors.push("price_threshold_pct must be positive".to_string());
        }
        if self.detector.volume_threshold <= 0.0 {
            errors.push("volume_threshold must be positive".to_string());
        }
        if self.detector.sma_threshold_pct <= 0.0 {
            errors.push("sma_threshold_pct must be positive".to_string());
        }
        if self.detector.history_window < 25 {
            errors.push(format!(
                "history_window must be at least 25 (SMA lookback), got {}",
                self.detector.history_window
            ));
        }

        if !errors.is_empty() {
            for error in &errors {
                warn!(error = %error, "Config validation error");
            }
            return Err(ConfigError::Validation(errors.join("; ")));
        }
        Ok(())
    }
}

fn env_f64(name: &str) -> Option<f64> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse::<f64>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(var = name, value = %raw, "Ignoring invalid numeric env override");
                None
            }
        },
        Err(_) => None,
    }
}
