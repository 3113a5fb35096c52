//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.
//! Every section is optional; missing keys fall back to the documented defaults.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::analytics::params::{
    AnalyticsConfig, ClusterParams, ExpirationParams, FilterParams, RegressionParams, VolatilityParams,
};

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub regression: RegressionParams,
    #[serde(default)]
    pub clusters: ClusterParams,
    #[serde(default)]
    pub expirations: ExpirationParams,
    #[serde(default)]
    pub volatility: VolatilityParams,
    #[serde(default)]
    pub filters: FilterParams,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Result cache configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// TTL for regression responses in seconds
    pub regression_ttl_secs: u64,
    /// TTL for composed alert lists in seconds
    pub alerts_ttl_secs: u64,
    /// Maximum entries per cache
    pub max_entries: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            regression_ttl_secs: 300,
            alerts_ttl_secs: 120,
            max_entries: 1000,
        }
    }
}

impl CacheSection {
    pub fn regression_ttl(&self) -> Duration {
        Duration::from_secs(self.regression_ttl_secs)
    }

    pub fn alerts_ttl(&self) -> Duration {
        Duration::from_secs(self.alerts_ttl_secs)
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl LoggingSection {
    /// Get log filter with environment variable override
    /// Checks FLOWSCOPE_LOG env var first, falls back to config value
    pub fn get_level(&self) -> String {
        std::env::var("FLOWSCOPE_LOG").unwrap_or_else(|_| self.level.clone())
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        AnalyticsConfig::from(self)
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        self.filters
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if self.cache.max_entries == 0 {
            return Err(ConfigError::ValidationError(
                "cache.max_entries must be > 0".to_string(),
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {:?}, got {:?}",
                LOG_LEVELS, self.logging.level
            )));
        }

        Ok(())
    }
}

// Conversion from Config to the analytics parameter set
impl From<&Config> for AnalyticsConfig {
    fn from(config: &Config) -> Self {
        AnalyticsConfig {
            regression: config.regression.clone(),
            clusters: config.clusters.clone(),
            expirations: config.expirations.clone(),
            volatility: config.volatility.clone(),
        }
    }
}
