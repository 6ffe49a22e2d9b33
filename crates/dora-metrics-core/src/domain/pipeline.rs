use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Stage status string the platform reports for a successful stage
pub const STAGE_SUCCEEDED: &str = "Succeeded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineExecutionState {
    Succeeded,
    Failed,
    Other(String),
}

impl PipelineExecutionState {
    pub fn parse(state: &str) -> Self {
        match state {
            "SUCCEEDED" => Self::Succeeded,
            "FAILED" => Self::Failed,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for PipelineExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Succeeded => write!(f, "SUCCEEDED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Other(state) => write!(f, "{}", state),
        }
    }
}

/// A pipeline execution state change.
///
/// The trigger fields are optional: executions started manually or by a
/// schedule carry no commit information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub pipeline_name: String,
    pub state: PipelineExecutionState,
    pub repository_name: Option<String>,
    pub branch_name: Option<String>,
    pub commit_id: Option<String>,
    pub commit_message: Option<String>,
    pub event_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStatus {
    pub stage_name: String,
    pub execution_status: Option<String>,
}

/// True when the named stage's latest execution succeeded
pub fn stage_succeeded(stages: &[StageStatus], stage_name: &str) -> bool {
    stages.iter().any(|stage| {
        stage.stage_name == stage_name && stage.execution_status.as_deref() == Some(STAGE_SUCCEEDED)
    })
}

/// Branch and repository a pipeline's source action is configured with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub branch_name: Option<String>,
    pub repository_name: Option<String>,
}

impl SourceConfig {
    /// The pair returned when the pipeline declares no usable source action
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn is_found(&self) -> bool {
        self.branch_name.is_some() || self.repository_name.is_some()
    }
}
