use async_trait::async_trait;

use crate::error::CollectorResult;
use crate::types::*;

/// Read access to the delivery-pipeline platform
#[async_trait]
pub trait PipelineIntrospection: Send + Sync {
    /// Fetch the declared structure of a pipeline.
    ///
    /// Returns `CollectorError::PipelineNotFound` for an unknown pipeline.
    async fn get_pipeline(&self, name: &str) -> CollectorResult<PipelineDefinition>;

    /// Fetch the latest execution status of each stage.
    ///
    /// Returns `CollectorError::PipelineNotFound` for an unknown pipeline.
    async fn get_pipeline_state(&self, name: &str) -> CollectorResult<PipelineState>;
}

/// Asynchronous query engine over the historical event log
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submit a query and return its execution id
    async fn start_query(&self, request: &QueryRequest) -> CollectorResult<String>;

    async fn query_status(&self, execution_id: &str) -> CollectorResult<QueryExecutionStatus>;

    /// Fetch result rows, header row excluded
    async fn query_results(&self, execution_id: &str) -> CollectorResult<Vec<ResultRow>>;
}

/// Read access to the incident-ticket store
#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn describe_incidents(
        &self, filters: &[IncidentFilter],
    ) -> CollectorResult<Vec<IncidentSummary>>;
}

/// Write-only metrics store
#[async_trait]
pub trait MetricSink: Send + Sync {
    async fn put_metric(&self, datum: &MetricDatum) -> CollectorResult<()>;
}
