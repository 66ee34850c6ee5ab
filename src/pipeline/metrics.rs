// Unified Metrics - One snapshot across feed parser, pipeline, and alert bus

use std::fmt;
use tracing::info;

use crate::core::events::AlertBusSnapshot;
use crate::feed::FeedParserStats;

use super::pipeline::PipelineStats;

/// Point-in-time view over every component that keeps counters.
#[derive(Debug, Clone)]
pub struct UnifiedMetrics {
    pub parser: Option<FeedParserStats>,
    pub pipeline: PipelineStats,
    pub alerts: Option<AlertBusSnapshot>,
}

impl UnifiedMetrics {
    pub fn from_stats(
        parser: Option<FeedParserStats>,
        pipeline: PipelineStats,
        alerts: Option<AlertBusSnapshot>,
    ) -> Self {
        Self {
            parser,
            pipeline,
            alerts,
        }
    }

    pub fn total_rejected(&self) -> u64 {
        self.pipeline.trades_rejected_late + self.pipeline.trades_rejected_malformed
    }

    /// Print a multi-line report through tracing.
    pub fn print_report(&self) {
        info!("=== SENTINEL METRICS ===");

        if let Some(parser) = &self.parser {
            info!(
                "  Feed:      parsed={} parse_errs={} validation_errs={} error_rate={:.4}",
                parser.messages_parsed,
                parser.parse_errors,
                parser.validation_failures,
                parser.error_rate()
            );
        }

        info!(
            "  Pipeline:  symbols={} trades={} candles={} rejected_late={} rejected_malformed={}",
            self.pipeline.symbol_count,
            self.pipeline.trades_processed,
            self.pipeline.candles_closed,
            self.pipeline.trades_rejected_late,
            self.pipeline.trades_rejected_malformed
        );
        info!(
            "  Detection: anomalies={} alert_failures={}",
            self.pipeline.anomalies_detected, self.pipeline.alert_failures
        );

        if let Some(alerts) = &self.alerts {
            info!(
                "  Alerts:    published={} delivered={} subscribers={} history={}",
                alerts.total_published,
                alerts.total_delivered,
                alerts.subscriber_count,
                alerts.history_size
            );
        }
    }
}

impl fmt::Display for UnifiedMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Metrics(trades={}, candles={}, anomalies={}, rejected={})",
            self.pipeline.trades_processed,
            self.pipeline.candles_closed,
            self.pipeline.anomalies_detected,
            self.total_rejected()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_rejected() {
        let mut pipeline = PipelineStats::default();
        pipeline.trades_rejected_late = 3;
        pipeline.trades_rejected_malformed = 2;

        let metrics = UnifiedMetrics::from_stats(None, pipeline, None);
        assert_eq!(metrics.total_rejected(), 5);
    }

    #[test]
    fn test_display_summary() {
        let mut pipeline = PipelineStats::default();
        pipeline.trades_processed = 10;
        pipeline.candles_closed = 2;

        let metrics = UnifiedMetrics::from_stats(None, pipeline, None);
        let text = format!("{}", metrics);
        assert!(text.contains("trades=10"));
        assert!(text.contains("candles=2"));
    }
}
