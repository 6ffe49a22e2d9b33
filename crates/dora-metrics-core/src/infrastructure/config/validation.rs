use super::schema::{
    AwsConfig,
    DoraConfig,
    GeneralConfig,
    HistoryConfig,
    ServerConfig,
};
use crate::domain::validate_identifier;

#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigError>,
    pub warnings: Vec<ConfigWarning>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: &str, message: impl Into<String>, code: ConfigErrorCode) {
        self.errors.push(ConfigError {
            field: field.to_string(),
            message: message.into(),
            code,
        });
    }

    pub fn add_warning(&mut self, field: &str, message: impl Into<String>) {
        self.warnings.push(ConfigWarning {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn summary(&self) -> String {
        if self.errors.is_empty() && self.warnings.is_empty() {
            "Configuration is valid".to_string()
        } else {
            format!(
                "{} error(s), {} warning(s)",
                self.errors.len(),
                self.warnings.len()
            )
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub field: String,
    pub message: String,
    pub code: ConfigErrorCode,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({})", self.field, self.message, self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    MissingRequired,
    InvalidValue,
}

impl std::fmt::Display for ConfigErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired => write!(f, "MISSING_REQUIRED"),
            Self::InvalidValue => write!(f, "INVALID_VALUE"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub struct ConfigValidator;

impl ConfigValidator {
    pub fn validate(config: &DoraConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        Self::validate_general(&config.general, &mut result);
        Self::validate_history(&config.history, &mut result);
        Self::validate_aws(&config.aws, &mut result);
        Self::validate_server(&config.server, &mut result);

        result
    }

    fn validate_general(general: &GeneralConfig, result: &mut ValidationResult) {
        let required = [
            ("general.default_branch", &general.default_branch),
            ("general.release_branch", &general.release_branch),
            ("general.prod_stage_name", &general.prod_stage_name),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                result.add_error(field, "Value cannot be empty", ConfigErrorCode::MissingRequired);
            }
        }

        if general.trunk_based_repositories.is_empty() {
            result.add_warning(
                "general.trunk_based_repositories",
                "No trunk-based repositories configured, every repository uses the release-branch model",
            );
        }
    }

    fn validate_history(history: &HistoryConfig, result: &mut ValidationResult) {
        if history.poll_interval_secs == 0 {
            result.add_error(
                "history.poll_interval_secs",
                "Poll interval must be positive",
                ConfigErrorCode::InvalidValue,
            );
        }

        if history.poll_interval_secs > history.timeout_secs {
            result.add_error(
                "history.poll_interval_secs",
                format!(
                    "Poll interval ({}s) exceeds the query timeout ({}s)",
                    history.poll_interval_secs, history.timeout_secs
                ),
                ConfigErrorCode::InvalidValue,
            );
        }

        let identifiers = [
            ("history.database", &history.database),
            ("history.table", &history.table),
        ];
        for (field, value) in identifiers {
            if value.is_empty() {
                result.add_warning(field, "Not set, lead time cannot be computed");
            } else if let Err(e) = validate_identifier(field, value) {
                result.add_error(field, e.to_string(), ConfigErrorCode::InvalidValue);
            }
        }

        if history.output_location.is_empty() {
            result.add_warning(
                "history.output_location",
                "Not set, lead time cannot be computed",
            );
        } else if !history.output_location.starts_with("s3://") {
            result.add_error(
                "history.output_location",
                "Output location must be an s3:// URI",
                ConfigErrorCode::InvalidValue,
            );
        }
    }

    fn validate_aws(aws: &AwsConfig, result: &mut ValidationResult) {
        let account = aws.tooling_account.trim();
        if !account.is_empty() && !(account.len() == 12 && account.bytes().all(|b| b.is_ascii_digit()))
        {
            result.add_error(
                "aws.tooling_account",
                format!("'{}' is not a 12-digit account id", account),
                ConfigErrorCode::InvalidValue,
            );
        }

        let role = aws.tooling_role_arn.trim();
        if !role.is_empty() && !role.starts_with("arn:") {
            result.add_error(
                "aws.tooling_role_arn",
                format!("'{}' is not an ARN", role),
                ConfigErrorCode::InvalidValue,
            );
        } else if !role.is_empty() && !account.is_empty() {
            // arn:partition:iam::account:role/name
            let role_account = role.split(':').nth(4).unwrap_or_default();
            if role_account != account {
                result.add_warning(
                    "aws.tooling_role_arn",
                    format!(
                        "Role belongs to account '{}', not the tooling account '{}'",
                        role_account, account
                    ),
                );
            }
        }

        for (service, url) in &aws.endpoints {
            if !url.starts_with("https://") && !url.starts_with("http://") {
                result.add_error(
                    &format!("aws.endpoints.{}", service),
                    "Endpoint must be an http(s) URL",
                    ConfigErrorCode::InvalidValue,
                );
            }
        }
    }

    fn validate_server(server: &ServerConfig, result: &mut ValidationResult) {
        if server.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            result.add_error(
                "server.bind_addr",
                format!("'{}' is not a socket address", server.bind_addr),
                ConfigErrorCode::InvalidValue,
            );
        }

        if server.invocation_timeout_secs == 0 {
            result.add_error(
                "server.invocation_timeout_secs",
                "Invocation timeout must be positive",
                ConfigErrorCode::InvalidValue,
            );
        }
    }
}
