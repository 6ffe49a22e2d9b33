use chrono::{
    DateTime,
    Utc,
};
use dora_metrics_api::{
    MetricDatum,
    MetricUnit,
};
use serde::{
    Deserialize,
    Serialize,
};

/// The four DORA metrics and where each one is published
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    DeploymentFrequency,
    LeadTime,
    ChangeFailureRate,
    MeanTimeToRestore,
}

impl MetricKind {
    pub const ALL: [MetricKind; 4] = [
        MetricKind::DeploymentFrequency,
        MetricKind::LeadTime,
        MetricKind::ChangeFailureRate,
        MetricKind::MeanTimeToRestore,
    ];

    pub fn namespace(&self) -> &'static str {
        match self {
            MetricKind::DeploymentFrequency | MetricKind::LeadTime => "DORA",
            MetricKind::ChangeFailureRate => "DORA/ChangeFailureRate",
            MetricKind::MeanTimeToRestore => "DORA/MeanTimeToRestore",
        }
    }

    pub fn metric_name(&self) -> &'static str {
        match self {
            MetricKind::DeploymentFrequency => "DeploymentFrequency",
            MetricKind::LeadTime => "LeadTimeForChange",
            MetricKind::ChangeFailureRate => "TotalFailedItems",
            MetricKind::MeanTimeToRestore => "Downtime-OPS-Item",
        }
    }

    pub fn unit(&self) -> MetricUnit {
        match self {
            MetricKind::DeploymentFrequency | MetricKind::ChangeFailureRate => MetricUnit::Count,
            MetricKind::LeadTime | MetricKind::MeanTimeToRestore => MetricUnit::Seconds,
        }
    }

    /// Acknowledgement body for a successful invocation
    pub fn success_message(&self) -> &'static str {
        match self {
            MetricKind::DeploymentFrequency => "Deployment frequency metric updated successfully",
            MetricKind::LeadTime => "Lead time for change metric updated successfully",
            MetricKind::ChangeFailureRate => "Metric updated successfully",
            MetricKind::MeanTimeToRestore => "Mean time to restore metric updated successfully",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            MetricKind::DeploymentFrequency => "deployment-frequency",
            MetricKind::LeadTime => "lead-time",
            MetricKind::ChangeFailureRate => "change-failure-rate",
            MetricKind::MeanTimeToRestore => "mean-time-to-restore",
        }
    }

    pub fn sample(&self, value: f64, timestamp: DateTime<Utc>) -> MetricSample {
        MetricSample {
            namespace: self.namespace().to_string(),
            metric_name: self.metric_name().to_string(),
            value,
            unit: self.unit(),
            timestamp,
        }
    }
}

impl std::fmt::Display for MetricKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for MetricKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("Unknown metric: {}", s))
    }
}

/// One derived value, stamped with the time it was computed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub namespace: String,
    pub metric_name: String,
    pub value: f64,
    pub unit: MetricUnit,
    pub timestamp: DateTime<Utc>,
}

impl From<MetricSample> for MetricDatum {
    fn from(sample: MetricSample) -> Self {
        MetricDatum {
            namespace: sample.namespace,
            metric_name: sample.metric_name,
            value: sample.value,
            unit: sample.unit,
            timestamp: sample.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog() {
        assert_eq!(MetricKind::DeploymentFrequency.namespace(), "DORA");
        assert_eq!(
            MetricKind::DeploymentFrequency.metric_name(),
            "DeploymentFrequency"
        );
        assert_eq!(MetricKind::LeadTime.metric_name(), "LeadTimeForChange");
        assert_eq!(MetricKind::LeadTime.unit(), MetricUnit::Seconds);
        assert_eq!(
            MetricKind::ChangeFailureRate.namespace(),
            "DORA/ChangeFailureRate"
        );
        assert_eq!(
            MetricKind::MeanTimeToRestore.metric_name(),
            "Downtime-OPS-Item"
        );
    }

    #[test]
    fn test_slug_round_trip() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.slug().parse::<MetricKind>().unwrap(), kind);
        }
        assert!("throughput".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_sample_into_datum() {
        let now = Utc::now();
        let datum: MetricDatum = MetricKind::MeanTimeToRestore.sample(3600.0, now).into();
        assert_eq!(datum.namespace, "DORA/MeanTimeToRestore");
        assert_eq!(datum.value, 3600.0);
        assert_eq!(datum.unit, MetricUnit::Seconds);
        assert_eq!(datum.timestamp, now);
    }
}
