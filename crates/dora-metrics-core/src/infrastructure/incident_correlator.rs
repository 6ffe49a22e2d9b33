use std::sync::Arc;

use chrono::{
    DateTime,
    Utc,
};
use dora_metrics_api::{
    IncidentFilter,
    IncidentStore,
};

use crate::domain::DomainResult;

/// Looks up incident tickets referenced by restore deployments
pub struct IncidentCorrelator {
    incidents: Arc<dyn IncidentStore>,
}

impl IncidentCorrelator {
    pub fn new(incidents: Arc<dyn IncidentStore>) -> Self {
        Self { incidents }
    }

    /// Creation time of the incident with exactly this id, if it exists
    pub async fn incident_creation_time(
        &self, incident_id: &str,
    ) -> DomainResult<Option<DateTime<Utc>>> {
        let matches = self
            .incidents
            .describe_incidents(&[IncidentFilter::id_equals(incident_id)])
            .await?;

        match matches.into_iter().next() {
            Some(incident) => {
                tracing::info!(
                    incident_id = %incident_id,
                    created = %incident.created_time,
                    "Incident found"
                );
                Ok(Some(incident.created_time))
            }
            None => {
                tracing::warn!(incident_id = %incident_id, "No incident matches id");
                Ok(None)
            }
        }
    }
}
