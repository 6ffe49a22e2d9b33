use dora_metrics_api::CollectorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("History query failed: {0}")]
    QueryFailed(String),

    #[error("History query timed out after {0} seconds")]
    QueryTimedOut(u64),

    #[error("Unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Upstream call failed: {0}")]
    Upstream(String),
}

impl DomainError {
    /// Structural failures come from the event itself rather than a dependency
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DomainError::MalformedEvent(_) | DomainError::UnsupportedEvent(_)
        )
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<CollectorError> for DomainError {
    fn from(err: CollectorError) -> Self {
        match err {
            CollectorError::PipelineNotFound(msg) => DomainError::PipelineNotFound(msg),
            CollectorError::InvalidConfig(msg) => DomainError::InvalidConfig(msg),
            other => DomainError::Upstream(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::MalformedEvent(err.to_string())
    }
}
