use std::sync::Arc;

use dora_metrics_core::MetricsContext;

#[derive(Clone)]
pub struct AppState {
    pub context: Arc<MetricsContext>,
}

impl AppState {
    pub fn new(context: MetricsContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }
}
