//! Signed HTTP transport shared by the service clients

use std::sync::Arc;
use std::sync::LazyLock;

use chrono::Utc;
use dora_metrics_api::{
    CollectorError,
    CollectorResult,
};
use regex::Regex;
use reqwest::{
    Client,
    StatusCode,
};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{
    parse_endpoint,
    AwsSettings,
    Service,
};
use crate::credentials::CredentialsProvider;
use crate::signing::{
    sign,
    SignableRequest,
};

pub(crate) const JSON_1_1: &str = "application/x-amz-json-1.1";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded; charset=utf-8";

static XML_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Code>([^<]+)</Code>").expect("Invalid regex pattern"));

static XML_MESSAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Message>([^<]*)</Message>").expect("Invalid regex pattern"));

const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "InvalidSignatureException",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

const THROTTLING_ERROR_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "RequestThrottled",
    "RequestThrottledException",
    "ProvisionedThroughputExceededException",
];

pub(crate) struct AwsClient {
    http: Client,
    service: Service,
    region: String,
    endpoint: String,
    host: String,
    path: String,
    credentials: Arc<dyn CredentialsProvider>,
}

impl AwsClient {
    pub fn new(
        http: Client, settings: &AwsSettings, service: Service,
        credentials: Arc<dyn CredentialsProvider>,
    ) -> CollectorResult<Self> {
        let endpoint = parse_endpoint(&settings.endpoint(service))?;

        Ok(Self {
            http,
            service,
            region: settings.region().to_string(),
            endpoint: endpoint.url,
            host: endpoint.host,
            path: endpoint.path,
            credentials,
        })
    }

    /// Calls a JSON-protocol operation, e.g. `CodePipeline_20150709.GetPipeline`
    pub async fn json_call<Req, Resp>(&self, target: &str, request: &Req) -> CollectorResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)?;
        let text = self
            .send(&[("Content-Type", JSON_1_1), ("X-Amz-Target", target)], body)
            .await?;

        serde_json::from_str(&text).map_err(|e| {
            CollectorError::SerializationError(format!("Failed to parse {target} response: {e}"))
        })
    }

    /// Calls a query-protocol operation and returns the raw response body
    pub async fn query_call(&self, params: &[(&str, String)]) -> CollectorResult<String> {
        let body = params
            .iter()
            .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        self.send(&[("Content-Type", FORM_URLENCODED)], body.into_bytes())
            .await
    }

    async fn send(&self, headers: &[(&str, &str)], body: Vec<u8>) -> CollectorResult<String> {
        let credentials = self.credentials.credentials().await?;
        let signed = sign(
            &SignableRequest {
                method: "POST",
                host: &self.host,
                path: &self.path,
                headers,
                body: &body,
            },
            &credentials,
            &self.region,
            self.service.signing_name(),
            Utc::now(),
        );

        let mut request = self
            .http
            .post(&self.endpoint)
            .header("Authorization", signed.authorization)
            .header("X-Amz-Date", signed.amz_date);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        if let Some(token) = signed.security_token {
            request = request.header("X-Amz-Security-Token", token);
        }

        let response = request.body(body).send().await.map_err(|e| {
            CollectorError::NetworkError(format!(
                "{} request failed: {e}",
                self.service.signing_name()
            ))
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CollectorError::NetworkError(format!(
                "Failed to read {} response: {e}",
                self.service.signing_name()
            ))
        })?;

        if status.is_success() {
            Ok(text)
        } else {
            Err(classify_error(status, &text))
        }
    }
}

/// Maps an error response body (JSON or XML) to a collaborator error
pub(crate) fn classify_error(status: StatusCode, body: &str) -> CollectorError {
    let (code, message) = parse_error_body(body);
    let code = code.unwrap_or_else(|| status.as_str().to_string());
    let message = message.unwrap_or_else(|| body.trim().to_string());

    if code.ends_with("PipelineNotFoundException") {
        return CollectorError::PipelineNotFound(message);
    }

    if AUTH_ERROR_CODES.contains(&code.as_str())
        || status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
    {
        return CollectorError::AuthenticationFailed(format!("{code}: {message}"));
    }

    let detail = format!("{} {code}: {message}", status.as_u16());
    if THROTTLING_ERROR_CODES.contains(&code.as_str()) || status == StatusCode::TOO_MANY_REQUESTS {
        return CollectorError::Throttled(detail);
    }
    if status.is_server_error() {
        return CollectorError::ServiceUnavailable(detail);
    }

    CollectorError::ApiError(detail)
}

fn parse_error_body(body: &str) -> (Option<String>, Option<String>) {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let code = json
            .get("__type")
            .and_then(|v| v.as_str())
            .map(normalize_error_code);
        let message = json
            .get("message")
            .or_else(|| json.get("Message"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
        return (code, message);
    }

    let code = XML_CODE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let message = XML_MESSAGE
        .captures(body)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    (code, message)
}

/// `com.amazonaws.codepipeline#PipelineNotFoundException` and
/// `PipelineNotFoundException:http://...` both become the bare shape name
fn normalize_error_code(raw: &str) -> String {
    let without_namespace = raw.rsplit('#').next().unwrap_or(raw);
    without_namespace
        .split(':')
        .next()
        .unwrap_or(without_namespace)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_not_found_json() {
        let body = r#"{"__type":"com.amazonaws.codepipeline#PipelineNotFoundException","message":"Pipeline 'ghost' not found"}"#;
        let err = classify_error(StatusCode::BAD_REQUEST, body);
        match err {
            CollectorError::PipelineNotFound(msg) => assert_eq!(msg, "Pipeline 'ghost' not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_auth_error_json() {
        let body = r#"{"__type":"UnrecognizedClientException","message":"The security token included in the request is invalid."}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, body),
            CollectorError::AuthenticationFailed(_)
        ));
    }

    #[test]
    fn test_xml_error() {
        let body = "<ErrorResponse><Error><Type>Sender</Type><Code>Throttling</Code><Message>Rate exceeded</Message></Error></ErrorResponse>";
        match classify_error(StatusCode::BAD_REQUEST, body) {
            CollectorError::Throttled(msg) => assert_eq!(msg, "400 Throttling: Rate exceeded"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_forbidden_without_body() {
        assert!(matches!(
            classify_error(StatusCode::FORBIDDEN, ""),
            CollectorError::AuthenticationFailed(_)
        ));
    }

    #[test]
    fn test_normalize_error_code() {
        assert_eq!(
            normalize_error_code("PipelineNotFoundException:http://internal.amazon.com/"),
            "PipelineNotFoundException"
        );
        assert_eq!(normalize_error_code("ThrottlingException"), "ThrottlingException");
    }

    #[test]
    fn test_client_and_server_errors() {
        let validation = r#"{"__type":"ValidationException","message":"1 validation error detected"}"#;
        assert!(matches!(
            classify_error(StatusCode::BAD_REQUEST, validation),
            CollectorError::ApiError(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            CollectorError::ServiceUnavailable(_)
        ));
        assert!(matches!(
            classify_error(StatusCode::TOO_MANY_REQUESTS, ""),
            CollectorError::Throttled(_)
        ));
    }
}
