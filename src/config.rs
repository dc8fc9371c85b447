//! Configuration for the version snapshot store.
//!
//! Supports YAML file and environment variable overrides.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "VERSION_SNAPSHOT_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "version-snapshot.yaml";

/// Default table holding every version snapshot.
pub const DEFAULT_TABLE_NAME: &str = "version_snapshot";

/// Backend type discriminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// Process-local map, nothing survives a restart.
    #[default]
    Memory,
    /// DynamoDB table (requires `dynamo` feature).
    Dynamo,
}

impl std::str::FromStr for BackendType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendType::Memory),
            "dynamo" | "dynamodb" => Ok(BackendType::Dynamo),
            other => Err(ConfigError::Invalid(format!(
                "Unknown backend type: {}",
                other
            ))),
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend type.
    pub backend: BackendType,
    /// Table holding all snapshots.
    pub table_name: String,
    /// AWS region override. Falls back to the environment's region.
    pub region: Option<String>,
    /// Endpoint override (e.g. `http://localhost:8000` for DynamoDB Local).
    pub endpoint: Option<String>,
    /// Per-request timeout in milliseconds. 0 disables the timeout.
    pub request_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            table_name: default_table_name(),
            region: None,
            endpoint: None,
            request_timeout_ms: 0,
        }
    }
}

fn default_table_name() -> String {
    DEFAULT_TABLE_NAME.to_string()
}

impl StoreConfig {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    ///
    /// A file named by `VERSION_SNAPSHOT_CONFIG` must exist; the default
    /// path is optional.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)?
            }
            Err(_) => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(backend) = std::env::var("VERSION_SNAPSHOT_BACKEND") {
            self.backend = backend.parse()?;
        }

        if let Ok(table) = std::env::var("VERSION_SNAPSHOT_TABLE") {
            self.table_name = table;
        }

        if let Ok(region) = std::env::var("VERSION_SNAPSHOT_REGION") {
            self.region = Some(region);
        }

        if let Ok(endpoint) = std::env::var("VERSION_SNAPSHOT_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }

        if let Ok(timeout) = std::env::var("VERSION_SNAPSHOT_TIMEOUT_MS") {
            self.request_timeout_ms = timeout.parse().map_err(|_| {
                ConfigError::Invalid(format!("VERSION_SNAPSHOT_TIMEOUT_MS: {}", timeout))
            })?;
        }

        Ok(())
    }

    /// Reject settings no backend could work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_name.is_empty() {
            return Err(ConfigError::Invalid("table_name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Get the request timeout, or None if disabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_ms > 0 {
            Some(Duration::from_millis(self.request_timeout_ms))
        } else {
            None
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
