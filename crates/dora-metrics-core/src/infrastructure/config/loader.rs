use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use super::env::apply_process_env;
use super::interpolation::{
    interpolate_toml,
    InterpolationError,
};
use super::schema::DoraConfig;
use super::validation::ConfigValidator;

pub const CONFIG_PATH_VAR: &str = "DORA_METRICS_CONFIG_PATH";

const SYSTEM_CONFIG_PATH: &str = "/etc/dora-metrics/config.toml";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Environment variable interpolation failed: {0}")]
    InterpolationError(#[from] InterpolationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigLoadResult<T> = Result<T, ConfigLoadError>;

pub struct ConfigLoader;

impl ConfigLoader {
    /// `DORA_METRICS_CONFIG_PATH`, then the system path, then the user config dir.
    ///
    /// Falls back to the user config path even when it does not exist.
    pub fn discover_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            tracing::debug!("Using config path from {}: {}", CONFIG_PATH_VAR, path);
            return PathBuf::from(path);
        }

        let system = PathBuf::from(SYSTEM_CONFIG_PATH);
        if system.exists() {
            tracing::debug!("Using system config path: {}", system.display());
            return system;
        }

        let user = dirs::config_dir()
            .map(|dir| dir.join("dora-metrics").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("dora-metrics.toml"));
        tracing::debug!("Using user config path: {}", user.display());
        user
    }

    pub fn load(path: &Path) -> ConfigLoadResult<DoraConfig> {
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// A missing file yields the defaults
    pub fn load_or_default(path: &Path) -> ConfigLoadResult<DoraConfig> {
        match Self::load(path) {
            Err(ConfigLoadError::FileNotFound(_)) => {
                tracing::info!(path = %path.display(), "No config file, using defaults");
                Ok(DoraConfig::default())
            }
            other => other,
        }
    }

    pub fn parse(content: &str) -> ConfigLoadResult<DoraConfig> {
        let mut value: toml::Value = toml::from_str(content)?;

        interpolate_toml(&mut value)?;

        let config: DoraConfig = value.try_into().map_err(|e| {
            ConfigLoadError::InvalidConfig(format!("Failed to deserialize config: {}", e))
        })?;

        tracing::debug!(
            trunk_based = config.general.trunk_based_repositories.len(),
            "Loaded config"
        );

        Ok(config)
    }

    /// File (if any), then legacy environment overrides, then validation
    pub fn resolve() -> ConfigLoadResult<DoraConfig> {
        let path = Self::discover_config_path();
        let mut config = Self::load_or_default(&path)?;
        apply_process_env(&mut config);
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &DoraConfig) -> ConfigLoadResult<()> {
        let result = ConfigValidator::validate(config);

        for warning in &result.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        if !result.is_ok() {
            let details = result
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(ConfigLoadError::InvalidConfig(details));
        }

        tracing::debug!("{}", result.summary());
        Ok(())
    }
}
