//! AWS Signature Version 4 request signing

use chrono::{
    DateTime,
    Utc,
};
use sha2::{
    Digest,
    Sha256,
};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

const HMAC_BLOCK_SIZE: usize = 64;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
            expires_at: None,
        }
    }

    /// True when the credentials expire within `margin` of `now`
    pub fn expires_within(&self, now: DateTime<Utc>, margin: chrono::Duration) -> bool {
        self.expires_at
            .map(|expiry| expiry - margin <= now)
            .unwrap_or(false)
    }
}

// Secrets stay out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// The parts of a request that take part in the signature
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    /// Extra headers to sign, besides `host` and `x-amz-date`
    pub headers: &'a [(&'a str, &'a str)],
    pub body: &'a [u8],
}

/// Headers to attach to the outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub authorization: String,
    pub amz_date: String,
    pub security_token: Option<String>,
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let mut block = [0u8; HMAC_BLOCK_SIZE];
    if key.len() > HMAC_BLOCK_SIZE {
        block[..32].copy_from_slice(&Sha256::digest(key));
    } else {
        block[..key.len()].copy_from_slice(key);
    }

    let mut inner = Sha256::new();
    inner.update(block.map(|b| b ^ 0x36));
    inner.update(data);
    let inner_hash = inner.finalize();

    let mut outer = Sha256::new();
    outer.update(block.map(|b| b ^ 0x5c));
    outer.update(inner_hash);
    outer.finalize().into()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

pub fn sign(
    request: &SignableRequest<'_>, credentials: &Credentials, region: &str, service: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    headers.push(("host".to_string(), request.host.to_string()));
    headers.push(("x-amz-date".to_string(), amz_date.clone()));
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token".to_string(), token.clone()));
    }
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        request.method,
        request.path,
        canonical_headers,
        signed_headers,
        sha256_hex(request.body)
    );

    let scope = format!("{date}/{region}/{service}/aws4_request");
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(&credentials.secret_access_key, &date, region, service);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        ),
        amz_date,
        security_token: credentials.session_token.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_hmac_rfc4231_case_2() {
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_hmac_long_key_is_hashed() {
        let long_key = [0xaau8; 131];
        let hashed_key = Sha256::digest(long_key);
        assert_eq!(
            hmac_sha256(&long_key, b"data"),
            hmac_sha256(&hashed_key, b"data")
        );
    }

    #[test]
    fn test_signing_key_documented_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_authorization_header_shape() {
        let now = Utc.with_ymd_and_hms(2023, 1, 1, 12, 30, 0).unwrap();
        let mut credentials = Credentials::new("AKIDEXAMPLE", "secret");
        credentials.session_token = Some("token".to_string());

        let request = SignableRequest {
            method: "POST",
            host: "codepipeline.us-east-1.amazonaws.com",
            path: "/",
            headers: &[
                ("Content-Type", "application/x-amz-json-1.1"),
                ("X-Amz-Target", "CodePipeline_20150709.GetPipeline"),
            ],
            body: b"{}",
        };

        let signed = sign(&request, &credentials, "us-east-1", "codepipeline", now);

        assert_eq!(signed.amz_date, "20230101T123000Z");
        assert_eq!(signed.security_token.as_deref(), Some("token"));
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20230101/us-east-1/codepipeline/aws4_request, "
        ));
        assert!(signed.authorization.contains(
            "SignedHeaders=content-type;host;x-amz-date;x-amz-security-token;x-amz-target, "
        ));
    }

    #[test]
    fn test_signature_depends_on_body() {
        let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let credentials = Credentials::new("AKID", "secret");
        let request = |body: &'static [u8]| SignableRequest {
            method: "POST",
            host: "athena.us-east-1.amazonaws.com",
            path: "/",
            headers: &[],
            body,
        };

        let a = sign(&request(b"{\"a\":1}"), &credentials, "us-east-1", "athena", now);
        let b = sign(&request(b"{\"a\":2}"), &credentials, "us-east-1", "athena", now);
        assert_ne!(a.authorization, b.authorization);
    }

    #[test]
    fn test_debug_hides_secret() {
        let credentials = Credentials::new("AKID", "super-secret");
        let rendered = format!("{:?}", credentials);
        assert!(rendered.contains("AKID"));
        assert!(!rendered.contains("super-secret"));
    }

    #[test]
    fn test_expiry_margin() {
        let now = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let mut credentials = Credentials::new("AKID", "secret");
        assert!(!credentials.expires_within(now, chrono::Duration::minutes(5)));

        credentials.expires_at = Some(now + chrono::Duration::minutes(3));
        assert!(credentials.expires_within(now, chrono::Duration::minutes(5)));

        credentials.expires_at = Some(now + chrono::Duration::hours(1));
        assert!(!credentials.expires_within(now, chrono::Duration::minutes(5)));
    }
}
