//! In-memory fakes for the collaborator traits (testing only)
//!
//! Each fake records the calls made against it so tests can assert on what
//! was (or was not) sent to the outside world.

use std::collections::{
    HashMap,
    VecDeque,
};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{
    CollectorError,
    CollectorResult,
};
use crate::provider::*;
use crate::types::*;

fn poisoned<T>(e: std::sync::PoisonError<T>) -> CollectorError {
    CollectorError::Internal(format!("Lock poisoned: {}", e))
}

// ---------------------------------------------------------------------------
// FakePipelines
// ---------------------------------------------------------------------------

/// Pipeline platform holding a fixed set of pipelines keyed by name
#[derive(Debug, Default)]
pub struct FakePipelines {
    pipelines: HashMap<String, (PipelineDefinition, PipelineState)>,
    calls: Mutex<Vec<String>>,
}

impl FakePipelines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(mut self, definition: PipelineDefinition, state: PipelineState) -> Self {
        self.pipelines
            .insert(definition.name.clone(), (definition, state));
        self
    }

    /// Names of the operations invoked so far, e.g. `get_pipeline:app`
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn record(&self, call: String) -> CollectorResult<()> {
        self.calls.lock().map_err(poisoned)?.push(call);
        Ok(())
    }
}

#[async_trait]
impl PipelineIntrospection for FakePipelines {
    async fn get_pipeline(&self, name: &str) -> CollectorResult<PipelineDefinition> {
        self.record(format!("get_pipeline:{name}"))?;
        self.pipelines
            .get(name)
            .map(|(definition, _)| definition.clone())
            .ok_or_else(|| CollectorError::PipelineNotFound(name.to_string()))
    }

    async fn get_pipeline_state(&self, name: &str) -> CollectorResult<PipelineState> {
        self.record(format!("get_pipeline_state:{name}"))?;
        self.pipelines
            .get(name)
            .map(|(_, state)| state.clone())
            .ok_or_else(|| CollectorError::PipelineNotFound(name.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ScriptedQueryEngine
// ---------------------------------------------------------------------------

/// Query engine that replays a scripted sequence of statuses.
///
/// Once the script is exhausted the last status is repeated.
#[derive(Debug)]
pub struct ScriptedQueryEngine {
    statuses: Mutex<VecDeque<QueryExecutionStatus>>,
    last_status: Mutex<Option<QueryExecutionStatus>>,
    rows: Vec<ResultRow>,
    submitted: Mutex<Vec<QueryRequest>>,
    status_polls: Mutex<usize>,
}

impl ScriptedQueryEngine {
    pub fn new(statuses: Vec<QueryExecutionState>, rows: Vec<ResultRow>) -> Self {
        Self {
            statuses: Mutex::new(
                statuses
                    .into_iter()
                    .map(QueryExecutionStatus::new)
                    .collect(),
            ),
            last_status: Mutex::new(None),
            rows,
            submitted: Mutex::new(Vec::new()),
            status_polls: Mutex::new(0),
        }
    }

    /// Engine whose query succeeds immediately with a single one-cell row
    pub fn succeeding_with(value: &str) -> Self {
        Self::new(
            vec![QueryExecutionState::Succeeded],
            vec![ResultRow {
                values: vec![Some(value.to_string())],
            }],
        )
    }

    pub fn submitted(&self) -> Vec<QueryRequest> {
        self.submitted
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn status_polls(&self) -> usize {
        *self.status_polls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl QueryEngine for ScriptedQueryEngine {
    async fn start_query(&self, request: &QueryRequest) -> CollectorResult<String> {
        let mut submitted = self.submitted.lock().map_err(poisoned)?;
        submitted.push(request.clone());
        Ok(format!("query-{}", submitted.len()))
    }

    async fn query_status(&self, _execution_id: &str) -> CollectorResult<QueryExecutionStatus> {
        *self.status_polls.lock().map_err(poisoned)? += 1;

        let next = self.statuses.lock().map_err(poisoned)?.pop_front();
        let mut last = self.last_status.lock().map_err(poisoned)?;
        if let Some(status) = next {
            *last = Some(status.clone());
            return Ok(status);
        }
        last.clone().ok_or_else(|| {
            CollectorError::Internal("Scripted query engine has no statuses".to_string())
        })
    }

    async fn query_results(&self, _execution_id: &str) -> CollectorResult<Vec<ResultRow>> {
        Ok(self.rows.clone())
    }
}

// ---------------------------------------------------------------------------
// FakeIncidents
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeIncidents {
    incidents: Vec<IncidentSummary>,
    lookups: Mutex<Vec<Vec<IncidentFilter>>>,
}

impl FakeIncidents {
    pub fn new(incidents: Vec<IncidentSummary>) -> Self {
        Self {
            incidents,
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn lookups(&self) -> Vec<Vec<IncidentFilter>> {
        self.lookups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl IncidentStore for FakeIncidents {
    async fn describe_incidents(
        &self, filters: &[IncidentFilter],
    ) -> CollectorResult<Vec<IncidentSummary>> {
        self.lookups.lock().map_err(poisoned)?.push(filters.to_vec());

        Ok(self
            .incidents
            .iter()
            .filter(|incident| {
                filters.iter().all(|filter| {
                    filter.key != "OpsItemId" || filter.values.iter().any(|v| v == &incident.id)
                })
            })
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Metric sink that keeps every published datum, or rejects all of them
#[derive(Debug, Default)]
pub struct RecordingSink {
    published: Mutex<Vec<MetricDatum>>,
    attempts: Mutex<usize>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<MetricDatum> {
        self.published
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Number of `put_metric` calls, failed ones included
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MetricSink for RecordingSink {
    async fn put_metric(&self, datum: &MetricDatum) -> CollectorResult<()> {
        *self.attempts.lock().map_err(poisoned)? += 1;
        if self.fail {
            return Err(CollectorError::NetworkError(
                "metric sink unavailable".to_string(),
            ));
        }
        self.published.lock().map_err(poisoned)?.push(datum.clone());
        Ok(())
    }
}
