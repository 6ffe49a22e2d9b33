use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};

use super::ReleaseSettings;
use crate::domain::{
    extract_incident_id,
    seconds_between,
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
    IncidentCorrelator,
    MetricEmitter,
    PipelineInspector,
};

/// A successful default-branch run is the only kind that can close an incident
pub fn is_restore_candidate(event: &PipelineEvent, settings: &ReleaseSettings) -> bool {
    event.state.is_succeeded() && event.branch_name.as_deref() == Some(settings.default_branch.as_str())
}

/// Downtime in seconds from incident creation to the restoring deployment
pub fn compute(
    event: &PipelineEvent, model: ReleaseModel, stages: &[StageStatus],
    incident_created: Option<DateTime<Utc>>, settings: &ReleaseSettings, now: DateTime<Utc>,
) -> Option<MetricSample> {
    let created = incident_created?;

    if model == ReleaseModel::TrunkBased && !stage_succeeded(stages, &settings.prod_stage_name) {
        return None;
    }

    let downtime = seconds_between(created, event.event_timestamp);
    // Release-branch repositories always report, even a zero or negative downtime.
    if model == ReleaseModel::TrunkBased && downtime <= 0.0 {
        tracing::warn!(
            pipeline = %event.pipeline_name,
            created = %created,
            event_time = %event.event_timestamp,
            "No downtime between incident and restore, sample suppressed"
        );
        return None;
    }

    Some(MetricKind::MeanTimeToRestore.sample(downtime, now))
}

pub struct MeanTimeToRestoreService {
    settings: Arc<ReleaseSettings>,
    inspector: Arc<PipelineInspector>,
    incidents: Arc<IncidentCorrelator>,
    emitter: Arc<MetricEmitter>,
    clock: Arc<dyn Clock>,
}

impl MeanTimeToRestoreService {
    pub fn new(
        settings: Arc<ReleaseSettings>, inspector: Arc<PipelineInspector>,
        incidents: Arc<IncidentCorrelator>, emitter: Arc<MetricEmitter>, clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            inspector,
            incidents,
            emitter,
            clock,
        }
    }

    pub async fn handle(&self, event: &PipelineEvent) -> DomainResult<Option<MetricSample>> {
        self.inspector.ensure_exists(&event.pipeline_name).await?;
        let stages = self.inspector.stage_statuses(&event.pipeline_name).await?;

        if !is_restore_candidate(event, &self.settings) {
            tracing::info!(
                pipeline = %event.pipeline_name,
                state = %event.state,
                branch = ?event.branch_name,
                "Not a successful '{}' run, nothing to restore",
                self.settings.default_branch
            );
            return Ok(None);
        }

        let Some(incident_id) = event
            .commit_message
            .as_deref()
            .and_then(extract_incident_id)
        else {
            tracing::warn!(
                pipeline = %event.pipeline_name,
                message = ?event.commit_message,
                "No incident reference in commit message"
            );
            return Ok(None);
        };

        let created = self.incidents.incident_creation_time(&incident_id).await?;
        let model = self
            .settings
            .release_model(event.repository_name.as_deref());

        let sample = compute(
            event,
            model,
            &stages,
            created,
            &self.settings,
            self.clock.now(),
        );

        if let Some(sample) = &sample {
            tracing::info!(
                pipeline = %event.pipeline_name,
                incident_id = %incident_id,
                seconds = sample.value,
                "Time to restore computed"
            );
            self.emitter.publish(sample).await;
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::PipelineExecutionState;

    fn t(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, hour, 0, 0).unwrap()
    }

    fn restore_event(branch: &str, state: PipelineExecutionState) -> PipelineEvent {
        PipelineEvent {
            pipeline_name: "app-pipeline".to_string(),
            state,
            repository_name: Some("acme/app".to_string()),
            branch_name: Some(branch.to_string()),
            commit_id: Some("a1b2c3d".to_string()),
            commit_message: Some("Merge pull request #123 from fix/oi-1/hotfix".to_string()),
            event_timestamp: t(1),
        }
    }

    #[test]
    fn test_restore_candidate() {
        let settings = ReleaseSettings::default();
        assert!(is_restore_candidate(
            &restore_event("main", PipelineExecutionState::Succeeded),
            &settings
        ));
        assert!(!is_restore_candidate(
            &restore_event("master", PipelineExecutionState::Succeeded),
            &settings
        ));
        assert!(!is_restore_candidate(
            &restore_event("main", PipelineExecutionState::Failed),
            &settings
        ));
    }

    #[test]
    fn test_one_hour_downtime() {
        let sample = compute(
            &restore_event("main", PipelineExecutionState::Succeeded),
            ReleaseModel::ReleaseBranch,
            &[],
            Some(t(0)),
            &ReleaseSettings::default(),
            t(2),
        )
        .unwrap();

        assert_eq!(sample.value, 3600.0);
        assert_eq!(sample.namespace, "DORA/MeanTimeToRestore");
        assert_eq!(sample.metric_name, "Downtime-OPS-Item");
    }

    #[test]
    fn test_no_incident_no_sample() {
        assert!(compute(
            &restore_event("main", PipelineExecutionState::Succeeded),
            ReleaseModel::ReleaseBranch,
            &[],
            None,
            &ReleaseSettings::default(),
            t(2),
        )
        .is_none());
    }

    #[test]
    fn test_trunk_based_gated_on_prod() {
        let stages = vec![StageStatus {
            stage_name: "DeployPROD".to_string(),
            execution_status: None,
        }];
        assert!(compute(
            &restore_event("main", PipelineExecutionState::Succeeded),
            ReleaseModel::TrunkBased,
            &stages,
            Some(t(0)),
            &ReleaseSettings::default(),
            t(2),
        )
        .is_none());
    }

    #[test]
    fn test_release_branch_reports_zero_downtime() {
        let sample = compute(
            &restore_event("main", PipelineExecutionState::Succeeded),
            ReleaseModel::ReleaseBranch,
            &[],
            Some(t(1)),
            &ReleaseSettings::default(),
            t(2),
        )
        .unwrap();

        assert_eq!(sample.value, 0.0);
    }

    #[test]
    fn test_trunk_based_suppresses_zero_downtime() {
        let stages = vec![StageStatus {
            stage_name: "DeployPROD".to_string(),
            execution_status: Some("Succeeded".to_string()),
        }];
        assert!(compute(
            &restore_event("main", PipelineExecutionState::Succeeded),
            ReleaseModel::TrunkBased,
            &stages,
            Some(t(1)),
            &ReleaseSettings::default(),
            t(2),
        )
        .is_none());
    }
}
