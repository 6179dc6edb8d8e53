//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::timeseries::MergeStrategy;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// QuantumLeap connection and query settings
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// QuantumLeap base URL
    #[serde(default = "default_url")]
    pub url: String,

    /// Orion Context Broker URL, passed along when creating subscriptions
    #[serde(default = "default_orion_url")]
    pub orion_url: String,

    /// Tenant sent as `Fiware-Service`
    pub service: Option<String>,

    /// Scope sent as `Fiware-ServicePath`
    pub service_path: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Records requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    #[serde(default)]
    pub merge_strategy: MergeStrategy,
}

fn default_url() -> String {
    "http://localhost:8668".to_string()
}

fn default_orion_url() -> String {
    "http://localhost:1026".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            orion_url: default_orion_url(),
            service: None,
            service_path: None,
            request_timeout_secs: default_request_timeout(),
            page_size: default_page_size(),
            merge_strategy: MergeStrategy::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("quantumleap").join("config.toml")),
            Some(PathBuf::from("./qlq.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::debug!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("QL_URL") {
            self.client.url = url;
        }
        if let Ok(url) = std::env::var("QL_ORION_URL") {
            self.client.orion_url = url;
        }
        if let Ok(service) = std::env::var("QL_FIWARE_SERVICE") {
            self.client.service = Some(service);
        }
        if let Ok(path) = std::env::var("QL_FIWARE_SERVICEPATH") {
            self.client.service_path = Some(path);
        }
        if let Ok(size) = std::env::var("QL_PAGE_SIZE") {
            if let Ok(n) = size.parse() {
                self.client.page_size = n;
            }
        }

        if let Ok(level) = std::env::var("QL_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("QL_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# QuantumLeap client configuration
#
# Environment variables override these settings:
# - QL_URL
# - QL_ORION_URL
# - QL_FIWARE_SERVICE
# - QL_FIWARE_SERVICEPATH
# - QL_PAGE_SIZE
# - QL_LOG_LEVEL
# - QL_LOG_FORMAT

[client]
# QuantumLeap base URL
url = "http://localhost:8668"

# Orion Context Broker URL (used when creating subscriptions)
orion_url = "http://localhost:1026"

# FIWARE tenant headers
# service = "smart_building"
# service_path = "/floor1"

# Request timeout in seconds
request_timeout_secs = 30

# Records requested per page
page_size = 5

# How multi-entity pages are merged: identity or positional
merge_strategy = "identity"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
