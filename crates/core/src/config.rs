//! Model configuration loaded from the environment

use std::collections::HashMap;
use std::env;
use thiserror::Error;

/// Environment variable naming the conventional primary key property
pub const ENV_DEFAULT_PRIMARY_KEY: &str = "MODELKIT_DEFAULT_PRIMARY_KEY";

/// Environment variable bounding nested include clauses
pub const ENV_MAX_INCLUDE_DEPTH: &str = "MODELKIT_MAX_INCLUDE_DEPTH";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: '{value}', expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Validation failed for {field}: {reason}")]
    ValidationFailed { field: String, reason: String },
}

/// Where a configuration value came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    EnvVar(String),
    Default,
}

/// Settings shared by the schema, the pipeline and the adapters
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Primary key property name assumed when a model declares none
    pub default_primary_key: String,
    /// Maximum nesting of include clauses accepted by a single call
    pub max_include_depth: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_primary_key: "id".to_string(),
            max_include_depth: 8,
        }
    }
}

impl ModelConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_primary_key =
            get_env_or_default(ENV_DEFAULT_PRIMARY_KEY, &defaults.default_primary_key);

        let depth = get_env_or_default(
            ENV_MAX_INCLUDE_DEPTH,
            &defaults.max_include_depth.to_string(),
        );
        let max_include_depth = depth.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
            field: "max_include_depth".to_string(),
            value: depth,
            expected: "non-negative integer".to_string(),
        })?;

        let config = Self {
            default_primary_key,
            max_include_depth,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_primary_key.trim().is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "default_primary_key".to_string(),
                reason: "Primary key name cannot be empty".to_string(),
            });
        }

        if self.max_include_depth == 0 {
            return Err(ConfigError::ValidationFailed {
                field: "max_include_depth".to_string(),
                reason: "Include depth must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let source = |var: &str| {
            if env::var(var).is_ok() {
                ConfigSource::EnvVar(var.to_string())
            } else {
                ConfigSource::Default
            }
        };

        let mut sources = HashMap::new();
        sources.insert(
            "default_primary_key".to_string(),
            source(ENV_DEFAULT_PRIMARY_KEY),
        );
        sources.insert(
            "max_include_depth".to_string(),
            source(ENV_MAX_INCLUDE_DEPTH),
        );
        sources
    }

    /// Set the conventional primary key name
    pub fn with_default_primary_key(mut self, name: impl Into<String>) -> Self {
        self.default_primary_key = name.into();
        self
    }

    /// Set the include nesting limit
    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
