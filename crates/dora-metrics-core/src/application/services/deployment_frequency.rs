use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};

use super::ReleaseSettings;
use crate::domain::{
    stage_succeeded,
    DomainResult,
    MetricKind,
    MetricSample,
    PipelineEvent,
    ReleaseModel,
    StageStatus,
};
use crate::infrastructure::{
    Clock,
    MetricEmitter,
    PipelineInspector,
};

/// Counts one deployment per successful production release
pub fn compute(
    event: &PipelineEvent, source_branch: Option<&str>, model: ReleaseModel,
    stages: &[StageStatus], settings: &ReleaseSettings, now: DateTime<Utc>,
) -> Option<MetricSample> {
    let deployed = match model {
        ReleaseModel::TrunkBased => stage_succeeded(stages, &settings.prod_stage_name),
        ReleaseModel::ReleaseBranch => {
            event.state.is_succeeded() && source_branch == Some(settings.release_branch.as_str())
        }
    };

    deployed.then(|| MetricKind::DeploymentFrequency.sample(1.0, now))
}

pub struct DeploymentFrequencyService {
    settings: Arc<ReleaseSettings>,
    inspector: Arc<PipelineInspector>,
    emitter: Arc<MetricEmitter>,
    clock: Arc<dyn Clock>,
}

impl DeploymentFrequencyService {
    pub fn new(
        settings: Arc<ReleaseSettings>, inspector: Arc<PipelineInspector>,
        emitter: Arc<MetricEmitter>, clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            inspector,
            emitter,
            clock,
        }
    }

    pub async fn handle(&self, event: &PipelineEvent) -> DomainResult<Option<MetricSample>> {
        let stages = self.inspector.stage_statuses(&event.pipeline_name).await?;
        let source = self.inspector.source_config(&event.pipeline_name).await?;
        let model = self
            .settings
            .release_model(source.repository_name.as_deref());

        let sample = compute(
            event,
            source.branch_name.as_deref(),
            model,
            &stages,
            &self.settings,
            self.clock.now(),
        );

        match &sample {
            Some(sample) => {
                tracing::info!(pipeline = %event.pipeline_name, model = %model, "Deployment counted");
                self.emitter.publish(sample).await;
            }
            None => {
                tracing::info!(
                    pipeline = %event.pipeline_name,
                    model = %model,
                    state = %event.state,
                    branch = ?source.branch_name,
                    "Not a production deployment"
                );
            }
        }

        Ok(sample)
    }
}
