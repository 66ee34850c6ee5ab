// Trade Message Parser - Exchange trade JSON to TradeEvent
// Decodes string-encoded decimals and validates before anything downstream

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::core::types::TradeEvent;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum FeedParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("unknown event type: {0}")]
    UnknownEventType(String),
    #[error("validation failed: {0}")]
    ValidationFailed(String),
}

// ============================================================================
// Raw Wire Format
// ============================================================================

/// Exchange trade payload. Price and quantity arrive as decimal strings.
#[derive(Debug, Deserialize)]
struct RawTrade {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E")]
    event_time: i64,
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "p")]
    price: String,
    #[serde(rename = "q")]
    quantity: String,
}

fn parse_f64_field(value: &str, field_name: &str) -> Result<f64, FeedParseError> {
    value.parse::<f64>().map_err(|_| {
        FeedParseError::ValidationFailed(format!("Invalid {}: '{}'", field_name, value))
    })
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct FeedParserStats {
    pub messages_parsed: u64,
    pub parse_errors: u64,
    pub validation_failures: u64,
}

impl FeedParserStats {
    pub fn error_rate(&self) -> f64 {
        let total = self.messages_parsed + self.parse_errors + self.validation_failures;
        if total == 0 {
            return 0.0;
        }
        (self.parse_errors + self.validation_failures) as f64 / total as f64
    }
}

/// Parses raw feed messages into validated `TradeEvent`s. Messages that do
/// not survive parsing never reach the aggregator.
pub struct TradeParser {
    pub stats: FeedParserStats,
}

impl TradeParser {
    pub fn new() -> Self {
        Self {
            stats: FeedParserStats::default(),
        }
    }

    pub fn parse(&mut self, raw_json: &str) -> Result<TradeEvent, FeedParseError> {
        let raw: RawTrade = serde_json::from_str(raw_json).map_err(|e| {
            self.stats.parse_errors += 1;
            FeedParseError::InvalidJson(e.to_string())
        })?;

        if raw.event_type != "trade" {
            self.stats.parse_errors += 1;
            return Err(FeedParseError::UnknownEventType(raw.event_type));
        }

        let trade = self.build_event(raw).map_err(|e| {
            self.stats.validation_failures += 1;
            e
        })?;

        self.stats.messages_parsed += 1;
        Ok(trade)
    }

    fn build_event(&self, raw: RawTrade) -> Result<TradeEvent, FeedParseError> {
        let price = parse_f64_field(&raw.price, "price")?;
        let quantity = parse_f64_field(&raw.quantity, "quantity")?;

        if raw.symbol.is_empty() {
            return Err(FeedParseError::ValidationFailed("empty symbol".to_string()));
        }
        if !price.is_finite() || price < 0.0 {
            return Err(FeedParseError::ValidationFailed(format!(
                "price {} out of domain",
                price
            )));
        }
        if !quantity.is_finite() || quantity < 0.0 {
            return Err(FeedParseError::ValidationFailed(format!(
                "quantity {} out of domain",
                quantity
            )));
        }
        if raw.event_time <= 0 {
            return Err(FeedParseError::ValidationFailed(format!(
                "event_time {} not a valid timestamp",
                raw.event_time
            )));
        }

        Ok(TradeEvent::new(raw.symbol, price, quantity, raw.event_time))
    }

    /// Parse, logging and swallowing failures. For drivers that want to
    /// keep reading a noisy stream.
    pub fn parse_lossy(&mut self, raw_json: &str) -> Option<TradeEvent> {
        match self.parse(raw_json) {
            Ok(trade) => Some(trade),
            Err(e) => {
                warn!(error = %e, "Dropping unparseable feed message");
                None
            }
        }
    }
}

impl Default for TradeParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_json(symbol: &str, price: &str, qty: &str, event_time: i64) -> String {
        format!(
            r#"{{"e":"trade","E":{},"s":"{}","p":"{}","q":"{}"}}"#,
            event_time, symbol, price, qty
        )
    }

    #[test]
    fn test_parse_valid_trade() {
        let mut parser = TradeParser::new();
        let json = trade_json("BTCUSDT", "50000.00", "0.1", 1_700_000_000_000);

        let trade = parser.parse(&json).expect("should parse");
        assert_eq!(trade.symbol, "BTCUSDT");
        assert!((trade.price - 50_000.0).abs() < 1e-9);
        assert!((trade.quantity - 0.1).abs() < 1e-9);
        assert_eq!(trade.event_time, 1_700_000_000_000);
        assert_eq!(parser.stats.messages_parsed, 1);
        assert_eq!(parser.stats.error_rate(), 0.0);
    }

    #[test]
    fn test_invalid_json_rejected() {
        let mut parser = TradeParser::new();
        let err = parser.parse("not json at all").unwrap_err();
        assert!(matches!(err, FeedParseError::InvalidJson(_)));
        assert_eq!(parser.stats.parse_errors, 1);
    }

    #[test]
    fn test_unknown_event_type_rejected() {
        let mut parser = TradeParser::new();
        let json = r#"{"e":"kline","E":1700000000000,"s":"BTCUSDT","p":"1","q":"1"}"#;
        let err = parser.parse(json).unwrap_err();
        assert!(matches!(err, FeedParseError::UnknownEventType(_)));
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let mut parser = TradeParser::new();
        let json = trade_json("BTCUSDT", "fifty-thousand", "0.1", 1_700_000_000_000);
        let err = parser.parse(&json).unwrap_err();
        assert!(matches!(err, FeedParseError::ValidationFailed(_)));
        assert_eq!(parser.stats.validation_failures, 1);
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let mut parser = TradeParser::new();
        let json = trade_json("BTCUSDT", "50000.0", "-1.0", 1_700_000_000_000);
        assert!(parser.parse(&json).is_err());
    }

    #[test]
    fn test_missing_timestamp_rejected() {
        let mut parser = TradeParser::new();
        // "E" absent entirely
        let json = r#"{"e":"trade","s":"BTCUSDT","p":"50000.0","q":"1.0"}"#;
        let err = parser.parse(json).unwrap_err();
        assert!(matches!(err, FeedParseError::InvalidJson(_)));
    }

    #[test]
    fn test_zero_timestamp_rejected() {
        let mut parser = TradeParser::new();
        let json = trade_json("BTCUSDT", "50000.0", "1.0", 0);
        let err = parser.parse(&json).unwrap_err();
        assert!(matches!(err, FeedParseError::ValidationFailed(_)));
    }

    #[test]
    fn test_parse_lossy_swallows_errors() {
        let mut parser = TradeParser::new();
        assert!(parser.parse_lossy("garbage").is_none());
        assert!(parser
            .parse_lossy(&trade_json("ETHUSDT", "3000.0", "2.0", 1_700_000_000_000))
            .is_some());
        assert_eq!(parser.stats.messages_parsed, 1);
        assert_eq!(parser.stats.parse_errors, 1);
    }
}
