//! DORA metrics correlation engine.
//!
//! Turns pipeline state-change and incident events into Deployment
//! Frequency, Lead Time for Change, Change Failure Rate and Mean Time to
//! Restore samples.

pub mod application;
pub mod domain;
pub mod event;
pub mod infrastructure;
pub mod logging;

use std::sync::Arc;

pub use application::{
    Ack,
    EventHandler,
    ReleaseSettings,
};
pub use domain::{
    DomainError,
    DomainResult,
    MetricKind,
    MetricSample,
    ReleaseModel,
};
use dora_metrics_api::{
    IncidentStore,
    MetricSink,
    PipelineIntrospection,
    QueryEngine,
};
use dora_metrics_aws::AwsCollaborators;
pub use event::InboundEvent;
pub use infrastructure::config::{
    ConfigLoader,
    DoraConfig,
};
use infrastructure::{
    Clock,
    HistoryQueryClient,
    HttpClientManager,
    IncidentCorrelator,
    MetricEmitter,
    PipelineInspector,
    TokioClock,
};

/// The external systems an invocation talks to
#[derive(Clone)]
pub struct Collaborators {
    pub pipelines: Arc<dyn PipelineIntrospection>,
    pub queries: Arc<dyn QueryEngine>,
    pub incidents: Arc<dyn IncidentStore>,
    pub sink: Arc<dyn MetricSink>,
}

impl From<AwsCollaborators> for Collaborators {
    fn from(aws: AwsCollaborators) -> Self {
        Self {
            pipelines: aws.pipelines,
            queries: aws.queries,
            incidents: aws.incidents,
            sink: aws.sink,
        }
    }
}

/// Everything built once at startup and shared by every invocation
pub struct MetricsContext {
    pub config: Arc<DoraConfig>,

    pub handler: Arc<EventHandler>,
}

impl MetricsContext {
    pub fn new(config: DoraConfig, collaborators: Collaborators, clock: Arc<dyn Clock>) -> Self {
        let settings = Arc::new(ReleaseSettings::from_config(&config));
        let inspector = Arc::new(PipelineInspector::new(collaborators.pipelines));
        let history = Arc::new(HistoryQueryClient::new(
            collaborators.queries,
            clock.clone(),
            config.history_settings(),
        ));
        let incidents = Arc::new(IncidentCorrelator::new(collaborators.incidents));
        let emitter = Arc::new(MetricEmitter::new(collaborators.sink));

        let handler = EventHandler::new(
            application::DeploymentFrequencyService::new(
                settings.clone(),
                inspector.clone(),
                emitter.clone(),
                clock.clone(),
            ),
            application::LeadTimeService::new(
                settings.clone(),
                inspector.clone(),
                history,
                emitter.clone(),
                clock.clone(),
            ),
            application::ChangeFailureRateService::new(emitter.clone(), clock.clone()),
            application::MeanTimeToRestoreService::new(
                settings, inspector, incidents, emitter, clock,
            ),
        );

        tracing::info!(
            trunk_based = config.general.trunk_based_repositories.len(),
            default_branch = %config.general.default_branch,
            prod_stage = %config.general.prod_stage_name,
            "Metrics context initialized"
        );

        Self {
            config: Arc::new(config),
            handler: Arc::new(handler),
        }
    }

    /// Production wiring: AWS clients over a shared HTTP client and the real clock
    pub fn from_config(config: DoraConfig) -> DomainResult<Self> {
        let http = HttpClientManager::new()?;
        let aws = AwsCollaborators::from_environment(http.client(), &config.aws_settings())?;
        Ok(Self::new(config, aws.into(), Arc::new(TokioClock)))
    }
}
