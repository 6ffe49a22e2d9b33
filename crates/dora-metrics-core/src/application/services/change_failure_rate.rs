use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};

use crate::domain::{
    DomainResult,
    IncidentEvent,
    MetricKind,
    MetricSample,
};
use crate::infrastructure::{
    Clock,
    MetricEmitter,
};

/// One failed item per newly opened incident; the rate itself is derived downstream
pub fn compute(event: &IncidentEvent, now: DateTime<Utc>) -> Option<MetricSample> {
    event
        .is_new_failure()
        .then(|| MetricKind::ChangeFailureRate.sample(1.0, now))
}

pub struct ChangeFailureRateService {
    emitter: Arc<MetricEmitter>,
    clock: Arc<dyn Clock>,
}

impl ChangeFailureRateService {
    pub fn new(emitter: Arc<MetricEmitter>, clock: Arc<dyn Clock>) -> Self {
        Self { emitter, clock }
    }

    pub async fn handle(&self, event: &IncidentEvent) -> DomainResult<Option<MetricSample>> {
        let sample = compute(event, self.clock.now());

        match &sample {
            Some(sample) => {
                tracing::info!("Incident opened, counting failed change");
                self.emitter.publish(sample).await;
            }
            None => {
                tracing::info!(
                    detail_type = %event.detail_type,
                    status = %event.status,
                    "Incident event is not a new failure"
                );
            }
        }

        Ok(sample)
    }
}
