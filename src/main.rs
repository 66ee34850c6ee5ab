// Sentinel Replay Driver
// Reads newline-delimited trade JSON from stdin, drives the pipeline, and
// prints a metrics report on EOF

use std::io::{self, BufRead};
use std::sync::Arc;

use market_sentinel::core::config::SentinelConfig;
use market_sentinel::core::events::AlertBus;
use market_sentinel::core::logger::setup_logging;
use market_sentinel::feed::TradeParser;
use market_sentinel::pipeline::{
    BusAlertSink, LogAlertSink, MemoryCandleStore, MultiSink, SentinelPipeline, UnifiedMetrics,
};
use tracing::{error, info};

fn main() {
    let config_path = std::env::args().nth(1);

    let config = match SentinelConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    setup_logging(
        Some(&config.monitoring.log_level),
        config.monitoring.json_logs,
    );

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    }

    let bus = Arc::new(AlertBus::new(config.monitoring.alert_history_size));
    let sink = MultiSink::new(vec![
        Box::new(LogAlertSink),
        Box::new(BusAlertSink::new(bus.clone())),
    ]);
    let mut pipeline = SentinelPipeline::new(
        config,
        Box::new(MemoryCandleStore::new()),
        Box::new(sink),
    );
    let mut parser = TradeParser::new();

    info!("Replay driver started, reading trades from stdin");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "Failed reading stdin");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        // Unparseable lines and rejected trades are logged inside the
        // components; the replay keeps going either way.
        if let Some(trade) = parser.parse_lossy(&line) {
            let _ = pipeline.process_trade(&trade);
        }
    }

    let flushed = pipeline.flush_all();
    info!(flushed, "Stream ended");

    let metrics = UnifiedMetrics::from_stats(
        Some(parser.stats.clone()),
        pipeline.stats(),
        Some(bus.snapshot()),
    );
    metrics.print_report();
}
