use std::sync::Arc;

use async_trait::async_trait;
use dora_metrics_api::{
    CollectorResult,
    MetricDatum,
    MetricSink,
};
use reqwest::Client;

use crate::client::AwsClient;
use crate::config::{
    AwsSettings,
    Service,
};
use crate::credentials::CredentialsProvider;
use crate::mapper;

/// Metric sink backed by CloudWatch.
///
/// Publishes are sent exactly once; there is no retry policy here.
pub struct CloudWatchClient {
    client: AwsClient,
}

impl CloudWatchClient {
    pub fn new(
        http: Client, settings: &AwsSettings, credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        Ok(Self {
            client: AwsClient::new(http, settings, Service::CloudWatch, credentials)?,
        })
    }
}

#[async_trait]
impl MetricSink for CloudWatchClient {
    async fn put_metric(&self, datum: &MetricDatum) -> CollectorResult<()> {
        self.client
            .query_call(&mapper::metric_datum_params(datum))
            .await?;
        Ok(())
    }
}
