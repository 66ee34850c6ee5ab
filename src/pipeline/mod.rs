// Pipeline - Orchestration of the core against its collaborators

pub mod alerts;
pub mod metrics;
#[allow(clippy::module_inception)]
pub mod pipeline;
pub mod store;

pub use alerts::{format_alert, AlertError, AlertSink, BusAlertSink, LogAlertSink, MultiSink};
pub use metrics::UnifiedMetrics;
pub use pipeline::{PipelineStats, SentinelPipeline};
pub use store::{CandleStore, MemoryCandleStore, StoreError};
