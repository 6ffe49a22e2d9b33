use std::sync::Arc;

use async_trait::async_trait;
use dora_metrics_api::{
    CollectorResult,
    QueryEngine,
    QueryExecutionStatus,
    QueryRequest,
    ResultRow,
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

/// Historical query engine backed by Athena
pub struct AthenaClient {
    client: AwsClient,
    retry_policy: RetryPolicy,
}

impl AthenaClient {
    pub fn new(
        http: Client, settings: &AwsSettings, credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        Ok(Self {
            client: AwsClient::new(http, settings, Service::Athena, credentials)?,
            retry_policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }
}

#[async_trait]
impl QueryEngine for AthenaClient {
    // Submission is not retried: a duplicate would start a second execution.
    async fn start_query(&self, request: &QueryRequest) -> CollectorResult<String> {
        let response: types::StartQueryExecutionResponse = self
            .client
            .json_call(
                "AmazonAthena.StartQueryExecution",
                &types::StartQueryExecutionRequest {
                    query_string: &request.query,
                    query_execution_context: types::QueryExecutionContext {
                        database: &request.database,
                    },
                    result_configuration: types::ResultConfiguration {
                        output_location: &request.output_location,
                    },
                },
            )
            .await?;

        tracing::debug!(execution_id = %response.query_execution_id, "Query submitted");
        Ok(response.query_execution_id)
    }

    async fn query_status(&self, execution_id: &str) -> CollectorResult<QueryExecutionStatus> {
        let request = types::QueryExecutionIdRequest {
            query_execution_id: execution_id,
            next_token: None,
        };
        let response: types::GetQueryExecutionResponse = self
            .retry_policy
            .retry(|| {
                self.client
                    .json_call("AmazonAthena.GetQueryExecution", &request)
            })
            .await?;

        mapper::map_query_status(response.query_execution.status)
    }

    async fn query_results(&self, execution_id: &str) -> CollectorResult<Vec<ResultRow>> {
        let mut rows = Vec::new();
        let mut next_token: Option<String> = None;
        let mut first_page = true;

        loop {
            let request = types::QueryExecutionIdRequest {
                query_execution_id: execution_id,
                next_token: next_token.as_deref(),
            };
            let response: types::GetQueryResultsResponse = self
                .retry_policy
                .retry(|| {
                    self.client
                        .json_call("AmazonAthena.GetQueryResults", &request)
                })
                .await?;

            rows.extend(mapper::map_result_rows(response.result_set, first_page));
            first_page = false;

            match response.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(rows)
    }
}
