//! Credential sources used to sign requests

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{
    DateTime,
    Utc,
};
use dora_metrics_api::{
    CollectorError,
    CollectorResult,
};
use reqwest::Client;
use tokio::sync::Mutex;

use crate::signing::Credentials;
use crate::sts::StsClient;
use crate::types::MetadataCredentials;

/// Temporary credentials are refreshed this long before they expire
const REFRESH_MARGIN_MINUTES: i64 = 5;

pub const CONTAINER_RELATIVE_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_RELATIVE_URI";
pub const CONTAINER_FULL_URI_VAR: &str = "AWS_CONTAINER_CREDENTIALS_FULL_URI";
pub const CONTAINER_TOKEN_VAR: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN";
pub const CONTAINER_TOKEN_FILE_VAR: &str = "AWS_CONTAINER_AUTHORIZATION_TOKEN_FILE";
pub const IMDS_ENDPOINT_VAR: &str = "AWS_EC2_METADATA_SERVICE_ENDPOINT";
pub const IMDS_DISABLED_VAR: &str = "AWS_EC2_METADATA_DISABLED";

const CONTAINER_HOST: &str = "http://169.254.170.2";
const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";
const IMDS_TOKEN_TTL_SECS: &str = "21600";
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

pub const SESSION_NAME: &str = "CrossAccountAccess";

#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    async fn credentials(&self) -> CollectorResult<Credentials>;
}

/// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentCredentials;

fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl CredentialsProvider for EnvironmentCredentials {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        let access_key_id = env_var("AWS_ACCESS_KEY_ID").ok_or_else(|| {
            CollectorError::AuthenticationFailed("AWS_ACCESS_KEY_ID is not set".to_string())
        })?;
        let secret_access_key = env_var("AWS_SECRET_ACCESS_KEY").ok_or_else(|| {
            CollectorError::AuthenticationFailed("AWS_SECRET_ACCESS_KEY is not set".to_string())
        })?;

        let mut credentials = Credentials::new(access_key_id, secret_access_key);
        credentials.session_token = env_var("AWS_SESSION_TOKEN");
        Ok(credentials)
    }
}

/// Fixed credentials, mostly for tests and local endpoints
#[derive(Debug, Clone)]
pub struct StaticCredentials(pub Credentials);

#[async_trait]
impl CredentialsProvider for StaticCredentials {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        Ok(self.0.clone())
    }
}

/// Temporary credentials for a cross-account role, cached until near expiry
pub struct AssumeRoleCredentials {
    sts: StsClient,
    role_arn: String,
    cached: Mutex<Option<Credentials>>,
}

impl AssumeRoleCredentials {
    pub fn new(sts: StsClient, role_arn: impl Into<String>) -> Self {
        Self {
            sts,
            role_arn: role_arn.into(),
            cached: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialsProvider for AssumeRoleCredentials {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        let mut cached = self.cached.lock().await;
        let margin = chrono::Duration::minutes(REFRESH_MARGIN_MINUTES);

        if let Some(credentials) = cached.as_ref() {
            if !credentials.expires_within(Utc::now(), margin) {
                return Ok(credentials.clone());
            }
        }

        tracing::debug!(role_arn = %self.role_arn, "Assuming cross-account role");
        let fresh = self.sts.assume_role(&self.role_arn, SESSION_NAME).await?;
        *cached = Some(fresh.clone());
        Ok(fresh)
    }
}

fn metadata_error(source: &str, detail: impl std::fmt::Display) -> CollectorError {
    CollectorError::AuthenticationFailed(format!("{source} credentials unavailable: {detail}"))
}

fn parse_metadata_credentials(source: &str, body: &str) -> CollectorResult<Credentials> {
    let wire: MetadataCredentials =
        serde_json::from_str(body).map_err(|e| metadata_error(source, e))?;

    if let Some(code) = wire.code.as_deref().filter(|code| *code != "Success") {
        return Err(metadata_error(source, format!("status {code}")));
    }

    let expires_at = wire
        .expiration
        .as_deref()
        .map(|raw| {
            DateTime::parse_from_rfc3339(raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| metadata_error(source, format!("invalid expiration '{raw}': {e}")))
        })
        .transpose()?;

    let mut credentials = Credentials::new(wire.access_key_id, wire.secret_access_key);
    credentials.session_token = wire.token;
    credentials.expires_at = expires_at;
    Ok(credentials)
}

async fn read_body(source: &str, response: reqwest::Response) -> CollectorResult<String> {
    let status = response.status();
    let body = response.text().await.map_err(|e| metadata_error(source, e))?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(metadata_error(source, format!("HTTP {}", status.as_u16())))
    }
}

/// Task role credentials served by the ECS/EKS container agent
pub struct ContainerCredentials {
    http: Client,
    url: String,
    authorization: Option<String>,
}

impl ContainerCredentials {
    pub fn new(http: Client, url: impl Into<String>, authorization: Option<String>) -> Self {
        Self {
            http,
            url: url.into(),
            authorization,
        }
    }

    /// `None` unless the container agent advertised a credentials URI
    pub fn from_env(http: Client) -> Option<Self> {
        let url = env_var(CONTAINER_RELATIVE_URI_VAR)
            .map(|relative| format!("{CONTAINER_HOST}{relative}"))
            .or_else(|| env_var(CONTAINER_FULL_URI_VAR))?;

        let authorization = env_var(CONTAINER_TOKEN_VAR).or_else(|| {
            env_var(CONTAINER_TOKEN_FILE_VAR)
                .and_then(|path| std::fs::read_to_string(path).ok())
                .map(|token| token.trim().to_string())
        });

        Some(Self::new(http, url, authorization))
    }
}

#[async_trait]
impl CredentialsProvider for ContainerCredentials {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        let mut request = self.http.get(&self.url).timeout(METADATA_TIMEOUT);
        if let Some(token) = &self.authorization {
            request = request.header("Authorization", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| metadata_error("Container", e))?;
        parse_metadata_credentials("Container", &read_body("Container", response).await?)
    }
}

/// Instance profile credentials from IMDSv2
pub struct InstanceMetadataCredentials {
    http: Client,
    endpoint: String,
}

impl InstanceMetadataCredentials {
    pub fn new(http: Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    /// `None` when `AWS_EC2_METADATA_DISABLED=true`
    pub fn from_env(http: Client) -> Option<Self> {
        if env_var(IMDS_DISABLED_VAR).is_some_and(|v| v.eq_ignore_ascii_case("true")) {
            return None;
        }
        let endpoint =
            env_var(IMDS_ENDPOINT_VAR).unwrap_or_else(|| DEFAULT_IMDS_ENDPOINT.to_string());
        Some(Self::new(http, endpoint))
    }

    async fn get(&self, path: &str, token: &str) -> CollectorResult<String> {
        let response = self
            .http
            .get(format!("{}{path}", self.endpoint))
            .header("X-aws-ec2-metadata-token", token)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| metadata_error("Instance metadata", e))?;
        read_body("Instance metadata", response).await
    }
}

#[async_trait]
impl CredentialsProvider for InstanceMetadataCredentials {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        let response = self
            .http
            .put(format!("{}/latest/api/token", self.endpoint))
            .header("X-aws-ec2-metadata-token-ttl-seconds", IMDS_TOKEN_TTL_SECS)
            .timeout(METADATA_TIMEOUT)
            .send()
            .await
            .map_err(|e| metadata_error("Instance metadata", e))?;
        let token = read_body("Instance metadata", response).await?;

        let roles = self
            .get("/latest/meta-data/iam/security-credentials/", &token)
            .await?;
        let role = roles
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| metadata_error("Instance metadata", "no instance profile attached"))?;

        let body = self
            .get(
                &format!("/latest/meta-data/iam/security-credentials/{role}"),
                &token,
            )
            .await?;
        parse_metadata_credentials("Instance metadata", &body)
    }
}

/// Tries each source in order; expiring credentials are cached until near expiry
pub struct CredentialsChain {
    sources: Vec<(&'static str, Arc<dyn CredentialsProvider>)>,
    cached: Mutex<Option<Credentials>>,
}

impl CredentialsChain {
    pub fn new(sources: Vec<(&'static str, Arc<dyn CredentialsProvider>)>) -> Self {
        Self {
            sources,
            cached: Mutex::new(None),
        }
    }

    /// Environment variables, then the container agent, then instance metadata
    pub fn from_environment(http: Client) -> Self {
        let mut sources: Vec<(&'static str, Arc<dyn CredentialsProvider>)> = Vec::new();
        let environment: Arc<dyn CredentialsProvider> = Arc::new(EnvironmentCredentials);
        sources.push(("environment", environment));
        if let Some(container) = ContainerCredentials::from_env(http.clone()) {
            let container: Arc<dyn CredentialsProvider> = Arc::new(container);
            sources.push(("container", container));
        }
        if let Some(imds) = InstanceMetadataCredentials::from_env(http) {
            let imds: Arc<dyn CredentialsProvider> = Arc::new(imds);
            sources.push(("instance metadata", imds));
        }
        Self::new(sources)
    }
}

#[async_trait]
impl CredentialsProvider for CredentialsChain {
    async fn credentials(&self) -> CollectorResult<Credentials> {
        let mut cached = self.cached.lock().await;
        let margin = chrono::Duration::minutes(REFRESH_MARGIN_MINUTES);

        if let Some(credentials) = cached.as_ref() {
            if !credentials.expires_within(Utc::now(), margin) {
                return Ok(credentials.clone());
            }
        }

        let mut failures = Vec::new();
        for (name, source) in &self.sources {
            match source.credentials().await {
                Ok(credentials) => {
                    tracing::debug!(source = %name, "Resolved AWS credentials");
                    *cached = credentials.expires_at.map(|_| credentials.clone());
                    return Ok(credentials);
                }
                Err(e) => failures.push(format!("{name}: {e}")),
            }
        }

        Err(CollectorError::AuthenticationFailed(format!(
            "No AWS credentials found ({})",
            failures.join("; ")
        )))
    }
}
