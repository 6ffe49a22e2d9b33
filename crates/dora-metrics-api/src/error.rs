use thiserror::Error;

/// Errors raised at the boundary of an external collaborator
#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request throttled: {0}")]
    Throttled(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pipeline not found: {0}")]
    PipelineNotFound(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CollectorError {
    /// Whether a read call failing with this error may be attempted again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CollectorError::NetworkError(_)
                | CollectorError::Throttled(_)
                | CollectorError::ServiceUnavailable(_)
        )
    }
}

pub type CollectorResult<T> = Result<T, CollectorError>;

impl From<serde_json::Error> for CollectorError {
    fn from(err: serde_json::Error) -> Self {
        CollectorError::SerializationError(err.to_string())
    }
}
