//! AWS collaborators for the DORA metrics engine.
//!
//! Every client speaks the service's HTTP protocol directly over `reqwest`
//! and signs requests with Signature Version 4. Pipeline introspection can
//! run under an assumed cross-account role; the other clients use the
//! ambient credentials of the process.

pub mod athena;
mod client;
pub mod cloudwatch;
pub mod codepipeline;
pub mod config;
pub mod credentials;
mod mapper;
pub mod signing;
pub mod ssm;
pub mod sts;
mod types;

use std::sync::Arc;

pub use athena::AthenaClient;
pub use cloudwatch::CloudWatchClient;
pub use codepipeline::CodePipelineClient;
pub use config::{
    AwsSettings,
    Service,
};
pub use credentials::{
    AssumeRoleCredentials,
    ContainerCredentials,
    CredentialsChain,
    CredentialsProvider,
    EnvironmentCredentials,
    InstanceMetadataCredentials,
    StaticCredentials,
};
use dora_metrics_api::{
    CollectorResult,
    IncidentStore,
    MetricSink,
    PipelineIntrospection,
    QueryEngine,
};
use reqwest::Client;
pub use signing::Credentials;
pub use ssm::OpsCenterClient;
pub use sts::StsClient;

/// The four collaborators the engine needs, backed by AWS
#[derive(Clone)]
pub struct AwsCollaborators {
    pub pipelines: Arc<dyn PipelineIntrospection>,
    pub queries: Arc<dyn QueryEngine>,
    pub incidents: Arc<dyn IncidentStore>,
    pub sink: Arc<dyn MetricSink>,
}

impl AwsCollaborators {
    /// Builds all clients from the ambient credentials: environment variables,
    /// then the container agent, then instance metadata
    pub fn from_environment(http: Client, settings: &AwsSettings) -> CollectorResult<Self> {
        let base = Arc::new(CredentialsChain::from_environment(http.clone()));
        Self::with_credentials(http, settings, base)
    }

    pub fn with_credentials(
        http: Client, settings: &AwsSettings, base: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        let pipeline_credentials: Arc<dyn CredentialsProvider> = match settings
            .tooling_role_arn
            .as_deref()
            .map(str::trim)
            .filter(|arn| !arn.is_empty())
        {
            Some(role_arn) => {
                tracing::info!(role_arn = %role_arn, "Pipeline introspection uses cross-account role");
                let sts = StsClient::new(http.clone(), settings, base.clone())?;
                Arc::new(AssumeRoleCredentials::new(sts, role_arn))
            }
            None => base.clone(),
        };

        Ok(Self {
            pipelines: Arc::new(CodePipelineClient::new(
                http.clone(),
                settings,
                pipeline_credentials,
            )?),
            queries: Arc::new(AthenaClient::new(http.clone(), settings, base.clone())?),
            incidents: Arc::new(OpsCenterClient::new(http.clone(), settings, base.clone())?),
            sink: Arc::new(CloudWatchClient::new(http, settings, base)?),
        })
    }
}
