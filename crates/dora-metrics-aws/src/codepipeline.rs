use std::sync::Arc;

use async_trait::async_trait;
use dora_metrics_api::{
    CollectorResult,
    PipelineDefinition,
    PipelineIntrospection,
    PipelineState,
    RetryPolicy,
};
use reqwest::Client;

use crate::client::AwsClient;
use crate::config::{
    AwsSettings,
    Service,
};
use crate::credentials::CredentialsProvider;
use crate::{
    mapper,
    types,
};

const TARGET_PREFIX: &str = "CodePipeline_20150709";

/// Pipeline introspection backed by the CodePipeline API
pub struct CodePipelineClient {
    client: AwsClient,
    retry_policy: RetryPolicy,
}

impl CodePipelineClient {
    pub fn new(
        http: Client, settings: &AwsSettings, credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        Ok(Self {
            client: AwsClient::new(http, settings, Service::CodePipeline, credentials)?,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

#[async_trait]
impl PipelineIntrospection for CodePipelineClient {
    async fn get_pipeline(&self, name: &str) -> CollectorResult<PipelineDefinition> {
        let target = format!("{TARGET_PREFIX}.GetPipeline");
        let request = types::PipelineNameRequest { name };
        let response: types::GetPipelineResponse = self
            .retry_policy
            .retry(|| self.client.json_call(&target, &request))
            .await?;

        Ok(mapper::map_pipeline(response.pipeline))
    }

    async fn get_pipeline_state(&self, name: &str) -> CollectorResult<PipelineState> {
        let target = format!("{TARGET_PREFIX}.GetPipelineState");
        let request = types::PipelineNameRequest { name };
        let response: types::GetPipelineStateResponse = self
            .retry_policy
            .retry(|| self.client.json_call(&target, &request))
            .await?;

        Ok(mapper::map_pipeline_state(name, response))
    }
}
