//! Configuration loading.
//!
//! A pipeline can be configured instead of built in code. Configuration is
//! loaded from (in order of priority, later overrides earlier):
//! 1. Default values (no envelope, pass-through schemas, no event logging)
//! 2. Config file: `/var/task/envelope.toml` (optional)
//! 3. `POWERTOOLS_LOGGER_LOG_EVENT`
//! 4. Crate-specific environment variables (`LAMBDA_ENVELOPE_*`)
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LAMBDA_ENVELOPE_ENVELOPE` | `envelope` |
//! | `LAMBDA_ENVELOPE_INBOUND_SCHEMA` | `inbound_schema` |
//! | `LAMBDA_ENVELOPE_OUTBOUND_SCHEMA` | `outbound_schema` |
//! | `LAMBDA_ENVELOPE_LOG_EVENT` | `log_event` |

use crate::envelope::Envelope;
use crate::error::ConfigError;
use crate::pipeline::Pipeline;
use crate::schema::ConfiguredSchema;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "/var/task/envelope.toml";
const ENV_PREFIX: &str = "LAMBDA_ENVELOPE_";
const LOG_EVENT_ENV: &str = "POWERTOOLS_LOGGER_LOG_EVENT";

/// Pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Envelope name, e.g. `sqs` or `eventbridge`. Unset means pass-through.
    pub envelope: Option<String>,
    /// Path to a JSON Schema file for the unwrapped payload.
    pub inbound_schema: Option<PathBuf>,
    /// Path to a JSON Schema file for the handler's return value.
    pub outbound_schema: Option<PathBuf>,
    /// Log every raw event at debug level.
    pub log_event: bool,
}

impl PipelineConfig {
    /// Loads configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Loads configuration from a custom config file path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(PipelineConfig::default()));

        if config_path.as_ref().exists() {
            figment = figment.merge(Toml::file(config_path));
        }

        figment = figment.merge(standard_env());
        figment = figment.merge(Env::prefixed(ENV_PREFIX));

        Ok(figment.extract()?)
    }

    /// Creates a new config builder for testing.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Resolves the configured envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope name is not recognised.
    pub fn resolve_envelope(&self) -> Result<Envelope, ConfigError> {
        Ok(Envelope::resolve(self.envelope.as_deref())?)
    }
}

impl Pipeline<ConfiguredSchema, ConfiguredSchema> {
    /// Builds a pipeline from configuration, compiling any schema files.
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope is unknown or a schema file cannot
    /// be loaded.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ConfigError> {
        let envelope = config.resolve_envelope()?;
        let inbound = ConfiguredSchema::load(config.inbound_schema.as_deref())?;

        let outbound = match config.outbound_schema.as_deref() {
            Some(path) => Some(ConfiguredSchema::load(Some(path))?),
            None => None,
        };

        let pipeline = Pipeline::builder(inbound)
            .envelope(envelope)
            .outbound_opt(outbound)
            .log_event(config.log_event)
            .build();

        tracing::debug!(
            envelope = envelope.name(),
            inbound_schema = ?config.inbound_schema,
            outbound_schema = ?config.outbound_schema,
            "pipeline configured"
        );
        Ok(pipeline)
    }
}

/// Builder for constructing configuration programmatically.
#[must_use = "builders do nothing unless .build() is called"]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new config builder with default values.
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Sets the envelope name.
    pub fn envelope(mut self, name: impl Into<String>) -> Self {
        self.config.envelope = Some(name.into());
        self
    }

    /// Sets the inbound schema file.
    pub fn inbound_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.inbound_schema = Some(path.into());
        self
    }

    /// Sets the outbound schema file.
    pub fn outbound_schema(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.outbound_schema = Some(path.into());
        self
    }

    /// Enables or disables raw event logging.
    pub fn log_event(mut self, enabled: bool) -> Self {
        self.config.log_event = enabled;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Serialize)]
struct PartialConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    log_event: Option<bool>,
}

fn standard_env() -> Serialized<PartialConfig> {
    let mut config = PartialConfig::default();

    if let Ok(value) = std::env::var(LOG_EVENT_ENV) {
        config.log_event = match value.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        };
    }

    Serialized::defaults(config)
}
