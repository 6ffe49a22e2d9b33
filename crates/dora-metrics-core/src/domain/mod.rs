pub mod error;
pub mod incident;
pub mod metrics;
pub mod pipeline;
pub mod release_model;
pub mod time;
pub mod validation;

pub use error::{
    DomainError,
    DomainResult,
};
pub use incident::{
    extract_incident_id,
    IncidentEvent,
};
pub use metrics::{
    MetricKind,
    MetricSample,
};
pub use pipeline::{
    stage_succeeded,
    PipelineEvent,
    PipelineExecutionState,
    SourceConfig,
    StageStatus,
};
pub use release_model::{
    resolve,
    ReleaseModel,
};
pub use time::{
    parse_timestamp,
    seconds_between,
};
pub use validation::{
    quote_literal,
    validate_commit_id,
    validate_identifier,
    validate_repository_name,
};
