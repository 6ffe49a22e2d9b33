//! One invocation: parse the event, run one calculator, acknowledge.

use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;

use super::services::change_failure_rate::ChangeFailureRateService;
use super::services::deployment_frequency::DeploymentFrequencyService;
use super::services::lead_time::LeadTimeService;
use super::services::mean_time_to_restore::MeanTimeToRestoreService;
use crate::domain::{
    DomainError,
    DomainResult,
    MetricKind,
    MetricSample,
};
use crate::event::InboundEvent;

pub const PIPELINE_NOT_FOUND_MESSAGE: &str = "Pipeline not found";

pub const PROCESSING_ERROR_MESSAGE: &str = "Error processing the event";

pub const INVALID_EVENT_MESSAGE: &str = "Invalid event";

/// Structured success/failure acknowledgement returned to the invoker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Ack {
    pub fn success(kind: MetricKind) -> Self {
        Self {
            status_code: 200,
            body: kind.success_message().to_string(),
        }
    }

    pub fn failure(error: &DomainError) -> Self {
        match error {
            DomainError::PipelineNotFound(_) => Self {
                status_code: 500,
                body: PIPELINE_NOT_FOUND_MESSAGE.to_string(),
            },
            e if e.is_client_error() => Self {
                status_code: 400,
                body: INVALID_EVENT_MESSAGE.to_string(),
            },
            _ => Self::processing_error(),
        }
    }

    pub fn processing_error() -> Self {
        Self {
            status_code: 500,
            body: PROCESSING_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

pub struct EventHandler {
    deployment_frequency: DeploymentFrequencyService,
    lead_time: LeadTimeService,
    change_failure_rate: ChangeFailureRateService,
    mean_time_to_restore: MeanTimeToRestoreService,
}

impl EventHandler {
    pub fn new(
        deployment_frequency: DeploymentFrequencyService, lead_time: LeadTimeService,
        change_failure_rate: ChangeFailureRateService,
        mean_time_to_restore: MeanTimeToRestoreService,
    ) -> Self {
        Self {
            deployment_frequency,
            lead_time,
            change_failure_rate,
            mean_time_to_restore,
        }
    }

    /// Runs the calculator for `kind`; yields at most one sample
    pub async fn invoke(
        &self, kind: MetricKind, payload: &Value,
    ) -> DomainResult<Option<MetricSample>> {
        let event = InboundEvent::parse(payload)?;
        tracing::info!(metric = %kind, event = event.kind(), "Processing event");

        match kind {
            MetricKind::DeploymentFrequency => {
                let event = event.into_pipeline_event()?;
                self.deployment_frequency.handle(&event).await
            }
            MetricKind::LeadTime => {
                let event = event.into_pipeline_event()?;
                self.lead_time.handle(&event).await
            }
            MetricKind::ChangeFailureRate => {
                let event = event.into_incident_event()?;
                self.change_failure_rate.handle(&event).await
            }
            MetricKind::MeanTimeToRestore => {
                let event = event.into_pipeline_event()?;
                self.mean_time_to_restore.handle(&event).await
            }
        }
    }

    pub async fn handle(&self, kind: MetricKind, payload: &Value) -> Ack {
        match self.invoke(kind, payload).await {
            Ok(sample) => {
                tracing::info!(metric = %kind, emitted = sample.is_some(), "Event processed");
                Ack::success(kind)
            }
            Err(e) => {
                tracing::error!(metric = %kind, error = %e, "Error processing event");
                Ack::failure(&e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_serializes_status_code() {
        let ack = Ack::success(MetricKind::ChangeFailureRate);
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["statusCode"], 200);
        assert_eq!(json["body"], "Metric updated successfully");
    }

    #[test]
    fn test_failure_acks() {
        assert_eq!(
            Ack::failure(&DomainError::PipelineNotFound("ghost".to_string())),
            Ack {
                status_code: 500,
                body: "Pipeline not found".to_string(),
            }
        );
        assert_eq!(
            Ack::failure(&DomainError::MalformedEvent("no detail".to_string())).status_code,
            400
        );
        assert_eq!(
            Ack::failure(&DomainError::QueryTimedOut(300)),
            Ack::processing_error()
        );
        assert!(!Ack::processing_error().is_success());
    }
}
