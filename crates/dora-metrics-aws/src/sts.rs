use std::sync::{
    Arc,
    LazyLock,
};

use chrono::{
    DateTime,
    Utc,
};
use dora_metrics_api::{
    CollectorError,
    CollectorResult,
};
use regex::Regex;
use reqwest::Client;

use crate::client::AwsClient;
use crate::config::{
    AwsSettings,
    Service,
};
use crate::credentials::CredentialsProvider;
use crate::signing::Credentials;

const API_VERSION: &str = "2011-06-15";

static ACCESS_KEY_ID: LazyLock<Regex> = LazyLock::new(|| xml_field("AccessKeyId"));
static SECRET_ACCESS_KEY: LazyLock<Regex> = LazyLock::new(|| xml_field("SecretAccessKey"));
static SESSION_TOKEN: LazyLock<Regex> = LazyLock::new(|| xml_field("SessionToken"));
static EXPIRATION: LazyLock<Regex> = LazyLock::new(|| xml_field("Expiration"));

fn xml_field(name: &str) -> Regex {
    Regex::new(&format!(r"<{name}>\s*([^<]+?)\s*</{name}>")).expect("Invalid regex pattern")
}

/// Security token service client
pub struct StsClient {
    client: AwsClient,
}

impl StsClient {
    pub fn new(
        http: Client, settings: &AwsSettings, credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        Ok(Self {
            client: AwsClient::new(http, settings, Service::Sts, credentials)?,
        })
    }

    pub async fn assume_role(
        &self, role_arn: &str, session_name: &str,
    ) -> CollectorResult<Credentials> {
        let body = self
            .client
            .query_call(&[
                ("Action", "AssumeRole".to_string()),
                ("Version", API_VERSION.to_string()),
                ("RoleArn", role_arn.to_string()),
                ("RoleSessionName", session_name.to_string()),
            ])
            .await?;

        parse_assume_role_response(&body)
    }
}

fn capture(regex: &Regex, body: &str) -> Option<String> {
    regex
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub(crate) fn parse_assume_role_response(body: &str) -> CollectorResult<Credentials> {
    let missing = |field: &str| {
        CollectorError::SerializationError(format!("AssumeRole response has no {field}"))
    };

    let access_key_id = capture(&ACCESS_KEY_ID, body).ok_or_else(|| missing("AccessKeyId"))?;
    let secret_access_key =
        capture(&SECRET_ACCESS_KEY, body).ok_or_else(|| missing("SecretAccessKey"))?;

    let expires_at = capture(&EXPIRATION, body)
        .map(|raw| {
            DateTime::parse_from_rfc3339(&raw)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| {
                    CollectorError::SerializationError(format!(
                        "Invalid credential expiration '{raw}': {e}"
                    ))
                })
        })
        .transpose()?;

    let mut credentials = Credentials::new(access_key_id, secret_access_key);
    credentials.session_token = capture(&SESSION_TOKEN, body);
    credentials.expires_at = expires_at;
    Ok(credentials)
}
