pub mod clock;
pub mod config;
pub mod emitter;
pub mod history_query;
pub mod http_client;
pub mod incident_correlator;
pub mod pipeline_inspector;

pub use clock::{
    Clock,
    ManualClock,
    TokioClock,
};
pub use emitter::MetricEmitter;
pub use history_query::{
    HistoryQueryClient,
    HistorySettings,
};
pub use http_client::HttpClientManager;
pub use incident_correlator::IncidentCorrelator;
pub use pipeline_inspector::PipelineInspector;
