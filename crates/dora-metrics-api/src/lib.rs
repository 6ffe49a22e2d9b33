//! Collaborator contracts for the DORA metrics correlation engine.
//!
//! The engine talks to four external systems: the pipeline platform, the
//! historical query engine, the incident store and the metrics sink. Each is
//! a trait here so the core can be driven by real clients in production and
//! by the in-memory [`fakes`] in tests.

pub mod error;
pub mod fakes;
pub mod provider;
pub mod types;
pub mod utils;

pub use error::{
    CollectorError,
    CollectorResult,
};
pub use provider::{
    IncidentStore,
    MetricSink,
    PipelineIntrospection,
    QueryEngine,
};
pub use types::{
    ActionDeclaration,
    FilterOperator,
    IncidentFilter,
    IncidentSummary,
    MetricDatum,
    MetricUnit,
    PipelineDefinition,
    PipelineState,
    QueryExecutionState,
    QueryExecutionStatus,
    QueryRequest,
    ResultRow,
    StageDeclaration,
    StageState,
    SOURCE_CATEGORY,
};
pub use utils::RetryPolicy;
