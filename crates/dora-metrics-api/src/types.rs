use std::collections::HashMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// Action category that marks a pipeline's source action
pub const SOURCE_CATEGORY: &str = "Source";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    pub name: String,
    pub stages: Vec<StageDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDeclaration {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDeclaration {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub configuration: HashMap<String, String>,
}

impl ActionDeclaration {
    pub fn is_source(&self) -> bool {
        self.category == SOURCE_CATEGORY
    }
}

/// Current execution state of a pipeline as reported by the platform.
///
/// `stage_states` is `None` when the platform response carried no stage data
/// at all, which is distinct from a pipeline with zero stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub pipeline_name: String,
    pub stage_states: Option<Vec<StageState>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageState {
    pub stage_name: String,
    pub latest_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    pub database: String,
    pub output_location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryExecutionState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl QueryExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            QueryExecutionState::Succeeded
                | QueryExecutionState::Failed
                | QueryExecutionState::Cancelled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryExecutionState::Queued => "QUEUED",
            QueryExecutionState::Running => "RUNNING",
            QueryExecutionState::Succeeded => "SUCCEEDED",
            QueryExecutionState::Failed => "FAILED",
            QueryExecutionState::Cancelled => "CANCELLED",
        }
    }
}

impl std::str::FromStr for QueryExecutionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(QueryExecutionState::Queued),
            "RUNNING" => Ok(QueryExecutionState::Running),
            "SUCCEEDED" => Ok(QueryExecutionState::Succeeded),
            "FAILED" => Ok(QueryExecutionState::Failed),
            "CANCELLED" => Ok(QueryExecutionState::Cancelled),
            _ => Err(format!("Unknown query state: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExecutionStatus {
    pub state: QueryExecutionState,
    pub reason: Option<String>,
}

impl QueryExecutionStatus {
    pub fn new(state: QueryExecutionState) -> Self {
        Self {
            state,
            reason: None,
        }
    }
}

/// One result row; a `None` cell is a SQL null
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub values: Vec<Option<String>>,
}

impl ResultRow {
    pub fn first_value(&self) -> Option<&str> {
        self.values.first().and_then(|v| v.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    Equal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentFilter {
    pub key: String,
    pub values: Vec<String>,
    pub operator: FilterOperator,
}

impl IncidentFilter {
    pub fn id_equals(incident_id: &str) -> Self {
        Self {
            key: "OpsItemId".to_string(),
            values: vec![incident_id.to_string()],
            operator: FilterOperator::Equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub status: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    Count,
    Seconds,
}

impl MetricUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricUnit::Count => "Count",
            MetricUnit::Seconds => "Seconds",
        }
    }
}

impl std::fmt::Display for MetricUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDatum {
    pub namespace: String,
    pub metric_name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}
