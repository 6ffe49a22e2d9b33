use std::sync::Arc;

use async_trait::async_trait;
use dora_metrics_api::{
    CollectorResult,
    IncidentFilter,
    IncidentStore,
    IncidentSummary,
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

/// Incident store backed by Systems Manager OpsCenter
pub struct OpsCenterClient {
    client: AwsClient,
    retry_policy: RetryPolicy,
}

impl OpsCenterClient {
    pub fn new(
        http: Client, settings: &AwsSettings, credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        Ok(Self {
            client: AwsClient::new(http, settings, Service::Ssm, credentials)?,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

#[async_trait]
impl IncidentStore for OpsCenterClient {
    async fn describe_incidents(
        &self, filters: &[IncidentFilter],
    ) -> CollectorResult<Vec<IncidentSummary>> {
        let mut incidents = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let request = types::DescribeOpsItemsRequest {
                ops_item_filters: filters.iter().map(mapper::map_filter).collect(),
                next_token: next_token.take(),
            };
            let response: types::DescribeOpsItemsResponse = self
                .retry_policy
                .retry(|| {
                    self.client
                        .json_call("AmazonSSM.DescribeOpsItems", &request)
                })
                .await?;

            for summary in response.ops_item_summaries {
                incidents.push(mapper::map_ops_item(summary)?);
            }

            match response.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(incidents)
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{
        body_json,
        header,
        method,
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::test_support::{
        http_client,
        settings_for,
        static_credentials,
    };

    #[tokio::test]
    async fn test_describe_by_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AmazonSSM.DescribeOpsItems"))
            .and(body_json(serde_json::json!({
                "OpsItemFilters": [
                    {"Key": "OpsItemId", "Values": ["oi-abc123"], "Operator": "Equal"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "OpsItemSummaries": [
                    {"OpsItemId": "oi-abc123", "CreatedTime": 1672567200.0, "Status": "Open", "Title": "Checkout down"}
                ]
            })))
            .mount(&server)
            .await;

        let store = OpsCenterClient::new(
            http_client(),
            &settings_for(Service::Ssm, &server.uri()),
            static_credentials(),
        )
        .unwrap();

        let incidents = store
            .describe_incidents(&[IncidentFilter::id_equals("oi-abc123")])
            .await
            .unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].created_time.timestamp(), 1_672_567_200);
        assert_eq!(incidents[0].title.as_deref(), Some("Checkout down"));
    }
}
