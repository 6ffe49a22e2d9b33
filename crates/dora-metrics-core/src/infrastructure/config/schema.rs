use std::collections::{
    BTreeSet,
    HashMap,
    HashSet,
};
use std::time::Duration;

use dora_metrics_aws::AwsSettings;
use serde::{
    Deserialize,
    Serialize,
};

use crate::infrastructure::history_query::HistorySettings;

pub(super) const DEFAULT_MAIN_BRANCH: &str = "main";

pub(super) const DEFAULT_RELEASE_BRANCH: &str = "master";

pub(super) const DEFAULT_PROD_STAGE_NAME: &str = "DeployPROD";

pub(super) const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 300;

pub(super) const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

pub(super) const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

pub(super) const DEFAULT_INVOCATION_TIMEOUT_SECS: u64 = 900;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DoraConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub aws: AwsConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

impl DoraConfig {
    pub fn trunk_based_set(&self) -> HashSet<String> {
        self.general
            .trunk_based_repositories
            .iter()
            .cloned()
            .collect()
    }

    pub fn history_settings(&self) -> HistorySettings {
        HistorySettings {
            database: self.history.database.clone(),
            table: self.history.table.clone(),
            output_location: self.history.output_location.clone(),
            timeout: Duration::from_secs(self.history.timeout_secs),
            poll_interval: Duration::from_secs(self.history.poll_interval_secs),
        }
    }

    pub fn aws_settings(&self) -> AwsSettings {
        AwsSettings {
            region: self.aws.region.clone(),
            tooling_role_arn: Some(self.aws.tooling_role_arn.trim())
                .filter(|arn| !arn.is_empty())
                .map(str::to_string),
            endpoints: self.aws.endpoints.clone(),
        }
    }

    pub fn invocation_timeout(&self) -> Duration {
        Duration::from_secs(self.server.invocation_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Branch whose successful deploys close incidents
    #[serde(default = "default_main_branch")]
    pub default_branch: String,

    /// Branch release-branch repositories deploy to production from
    #[serde(default = "default_release_branch")]
    pub release_branch: String,

    #[serde(default = "default_prod_stage_name")]
    pub prod_stage_name: String,

    #[serde(default)]
    pub trunk_based_repositories: BTreeSet<String>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_branch: default_main_branch(),
            release_branch: default_release_branch(),
            prod_stage_name: default_prod_stage_name(),
            trunk_based_repositories: BTreeSet::new(),
        }
    }
}

fn default_main_branch() -> String {
    DEFAULT_MAIN_BRANCH.to_string()
}

fn default_release_branch() -> String {
    DEFAULT_RELEASE_BRANCH.to_string()
}

fn default_prod_stage_name() -> String {
    DEFAULT_PROD_STAGE_NAME.to_string()
}

/// Location of the push-event log and how long to wait on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub table: String,

    #[serde(default)]
    pub output_location: String,

    #[serde(default = "default_query_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            table: String::new(),
            output_location: String::new(),
            timeout_secs: default_query_timeout(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

fn default_query_timeout() -> u64 {
    DEFAULT_QUERY_TIMEOUT_SECS
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AwsConfig {
    #[serde(default)]
    pub region: String,

    /// Account id the tooling role must live in
    #[serde(default)]
    pub tooling_account: String,

    #[serde(default)]
    pub tooling_role_arn: String,

    /// Endpoint overrides keyed by service: codepipeline, athena, ssm, cloudwatch, sts
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_invocation_timeout")]
    pub invocation_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            invocation_timeout_secs: default_invocation_timeout(),
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_invocation_timeout() -> u64 {
    DEFAULT_INVOCATION_TIMEOUT_SECS
}
