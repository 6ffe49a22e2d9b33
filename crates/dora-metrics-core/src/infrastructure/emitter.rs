use std::sync::Arc;

use dora_metrics_api::{
    MetricDatum,
    MetricSink,
};

use crate::domain::MetricSample;

/// Publishes samples to the metric sink without ever failing the caller
pub struct MetricEmitter {
    sink: Arc<dyn MetricSink>,
}

impl MetricEmitter {
    pub fn new(sink: Arc<dyn MetricSink>) -> Self {
        Self { sink }
    }

    /// Returns whether the sink accepted the sample
    pub async fn publish(&self, sample: &MetricSample) -> bool {
        let datum = MetricDatum::from(sample.clone());

        match self.sink.put_metric(&datum).await {
            Ok(()) => {
                tracing::info!(
                    namespace = %datum.namespace,
                    metric = %datum.metric_name,
                    value = datum.value,
                    unit = %datum.unit,
                    "Metric published"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    namespace = %datum.namespace,
                    metric = %datum.metric_name,
                    error = %e,
                    "Failed to publish metric"
                );
                false
            }
        }
    }
}
