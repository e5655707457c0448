use std::collections::HashMap;
use std::env;
use std::str::FromStr;

use thiserror::Error;

/// Environment variable selecting the id generation strategy
pub const ID_STRATEGY_VAR: &str = "RELIC_ID_STRATEGY";
/// Environment variable overriding the generated id prefix
pub const ID_PREFIX_VAR: &str = "RELIC_ID_PREFIX";

const DEFAULT_ID_PREFIX: &str = "relic_";

/// Configuration trait for record configuration
pub trait RecordConfigTrait: Sized {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self, ConfigError>;

    /// Validate the configuration
    fn validate(&self) -> Result<(), ConfigError>;

    /// Get configuration source information for debugging
    fn config_sources(&self) -> HashMap<String, ConfigSource>;
}

/// How fresh record ids are produced on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// `<prefix><n>` from a process-wide counter
    Sequential,
    /// `<prefix><uuid v4>`
    Uuid,
}

impl FromStr for IdStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" | "counter" => Ok(IdStrategy::Sequential),
            "uuid" => Ok(IdStrategy::Uuid),
            _ => Err(ConfigError::InvalidValue {
                field: "id_strategy".to_string(),
                value: s.to_string(),
                expected: "sequential or uuid".to_string(),
            }),
        }
    }
}

impl std::fmt::Display for IdStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            IdStrategy::Sequential => "sequential",
            IdStrategy::Uuid => "uuid",
        };
        write!(f, "{}", name)
    }
}

/// Configuration source information for debugging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Value loaded from environment variable
    EnvVar(String),
    /// Default value used
    Default(String),
    /// Value provided programmatically
    Programmatic,
}

impl ConfigSource {
    /// Check if source is environment variable
    pub fn is_env_var(&self) -> bool {
        matches!(self, ConfigSource::EnvVar(_))
    }

    /// Check if source is default value
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigSource::Default(_))
    }

    /// Get source description
    pub fn description(&self) -> String {
        match self {
            ConfigSource::EnvVar(var) => format!("Environment variable: {}", var),
            ConfigSource::Default(value) => format!("Default value: {}", value),
            ConfigSource::Programmatic => "Programmatically set".to_string(),
        }
    }
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Registry-wide record configuration
#[derive(Debug, Clone)]
pub struct RecordConfig {
    pub id_strategy: IdStrategy,
    pub id_prefix: String,
    sources: HashMap<String, ConfigSource>,
}

impl RecordConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        let mut sources = HashMap::new();
        sources.insert(
            "id_strategy".to_string(),
            ConfigSource::Default(IdStrategy::Sequential.to_string()),
        );
        sources.insert(
            "id_prefix".to_string(),
            ConfigSource::Default(DEFAULT_ID_PREFIX.to_string()),
        );

        Self {
            id_strategy: IdStrategy::Sequential,
            id_prefix: DEFAULT_ID_PREFIX.to_string(),
            sources,
        }
    }

    /// Set the id strategy programmatically
    pub fn with_id_strategy(mut self, strategy: IdStrategy) -> Self {
        self.id_strategy = strategy;
        self.sources
            .insert("id_strategy".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Set the id prefix programmatically
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self.sources
            .insert("id_prefix".to_string(), ConfigSource::Programmatic);
        self
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(strategy) = lookup(ID_STRATEGY_VAR) {
            config.id_strategy = strategy.parse()?;
            config.sources.insert(
                "id_strategy".to_string(),
                ConfigSource::EnvVar(ID_STRATEGY_VAR.to_string()),
            );
        }

        if let Some(prefix) = lookup(ID_PREFIX_VAR) {
            config.id_prefix = prefix;
            config.sources.insert(
                "id_prefix".to_string(),
                ConfigSource::EnvVar(ID_PREFIX_VAR.to_string()),
            );
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordConfigTrait for RecordConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.id_prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidValue {
                field: "id_prefix".to_string(),
                value: self.id_prefix.clone(),
                expected: "a prefix without whitespace".to_string(),
            });
        }

        if self.id_strategy == IdStrategy::Sequential && self.id_prefix.is_empty() {
            return Err(ConfigError::ValidationFailed {
                field: "id_prefix".to_string(),
                reason: "sequential ids need a non-empty prefix to stay opaque".to_string(),
            });
        }

        Ok(())
    }

    fn config_sources(&self) -> HashMap<String, ConfigSource> {
        self.sources.clone()
    }
}

/// Configuration errors
#[derive(Debug, Error)]
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
