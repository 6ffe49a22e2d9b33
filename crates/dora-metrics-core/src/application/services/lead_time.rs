use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};

use super::ReleaseSettings;
use crate::domain::{
    seconds_between,
    stage_succeeded,
    DomainError,
    DomainResult,
    MetricKind,
    MetricSample,
    PipelineEvent,
    ReleaseModel,
    StageStatus,
};
use crate::infrastructure::{
    Clock,
    HistoryQueryClient,
    MetricEmitter,
    PipelineInspector,
};

/// Seconds from the commit's first push to the pipeline event
pub fn compute(
    event: &PipelineEvent, model: ReleaseModel, stages: &[StageStatus],
    earliest_commit_time: Option<DateTime<Utc>>, settings: &ReleaseSettings, now: DateTime<Utc>,
) -> Option<MetricSample> {
    let earliest = earliest_commit_time?;

    if model == ReleaseModel::TrunkBased && !stage_succeeded(stages, &settings.prod_stage_name) {
        return None;
    }

    let elapsed = seconds_between(earliest, event.event_timestamp);
    if elapsed <= 0.0 {
        tracing::warn!(
            pipeline = %event.pipeline_name,
            earliest = %earliest,
            event_time = %event.event_timestamp,
            "Commit is not older than the pipeline event, lead time suppressed"
        );
        return None;
    }

    Some(MetricKind::LeadTime.sample(elapsed, now))
}

pub struct LeadTimeService {
    settings: Arc<ReleaseSettings>,
    inspector: Arc<PipelineInspector>,
    history: Arc<HistoryQueryClient>,
    emitter: Arc<MetricEmitter>,
    clock: Arc<dyn Clock>,
}

impl LeadTimeService {
    pub fn new(
        settings: Arc<ReleaseSettings>, inspector: Arc<PipelineInspector>,
        history: Arc<HistoryQueryClient>, emitter: Arc<MetricEmitter>, clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            inspector,
            history,
            emitter,
            clock,
        }
    }

    pub async fn handle(&self, event: &PipelineEvent) -> DomainResult<Option<MetricSample>> {
        let stages = self.inspector.stage_statuses(&event.pipeline_name).await?;

        let commit_id = event.commit_id.as_deref().ok_or_else(|| {
            DomainError::MalformedEvent("Pipeline event has no commit-id".to_string())
        })?;
        let repository = event.repository_name.as_deref().ok_or_else(|| {
            DomainError::MalformedEvent("Pipeline event has no full-repository-name".to_string())
        })?;

        let model = self.settings.release_model(Some(repository));
        if model == ReleaseModel::TrunkBased
            && !stage_succeeded(&stages, &self.settings.prod_stage_name)
        {
            tracing::info!(
                pipeline = %event.pipeline_name,
                stage = %self.settings.prod_stage_name,
                "Production stage has not succeeded, skipping lead time"
            );
            return Ok(None);
        }

        let earliest = self
            .history
            .earliest_commit_time(commit_id, repository)
            .await?;

        let sample = compute(
            event,
            model,
            &stages,
            earliest,
            &self.settings,
            self.clock.now(),
        );

        if let Some(sample) = &sample {
            tracing::info!(
                pipeline = %event.pipeline_name,
                commit_id = %commit_id,
                seconds = sample.value,
                "Lead time computed"
            );
            self.emitter.publish(sample).await;
        }

        Ok(sample)
    }
}
