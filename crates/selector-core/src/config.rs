use std::{env, path::Path};

use anyhow::{Context, Result};
use config as cfg;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    /// `size` sent in dashboard callback conditions.
    #[serde(default = "CascadeConfig::default_condition_size")]
    pub condition_size: usize,
    /// Buffered selection events per subscriber before lagging.
    #[serde(default = "CascadeConfig::default_event_capacity")]
    pub event_capacity: usize,
}

impl CascadeConfig {
    fn default_condition_size() -> usize {
        20
    }

    fn default_event_capacity() -> usize {
        256
    }
}

impl Default for CascadeConfig {
    fn default() -> Self {
        Self {
            condition_size: Self::default_condition_size(),
            event_capacity: Self::default_event_capacity(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSettings {
    #[serde(default)]
    pub cascade: CascadeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SelectorSettings {
    pub fn default_env() -> String {
        env::var("APP_ENV").unwrap_or_else(|_| "development".to_string())
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.cascade.condition_size > 0,
            "cascade.condition_size must be > 0"
        );
        anyhow::ensure!(
            self.cascade.event_capacity > 0,
            "cascade.event_capacity must be > 0"
        );
        anyhow::ensure!(
            !self.logging.level.trim().is_empty(),
            "logging.level cannot be empty"
        );
        Ok(())
    }

    /// Layer `default.toml`, `{env}.toml`, `local.toml` and `SELECTOR__*` env vars.
    pub fn load_from_sources(config_dir: &Path, env_name: &str) -> Result<Self> {
        let settings: SelectorSettings = cfg::Config::builder()
            .add_source(cfg::File::from(config_dir.join("default.toml")).required(false))
            .add_source(
                cfg::File::from(config_dir.join(format!("{}.toml", env_name))).required(false),
            )
            .add_source(cfg::File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                cfg::Environment::with_prefix("SELECTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("building configuration")?
            .try_deserialize()
            .context("deserializing configuration")?;
        settings.validate()?;
        info!("Loaded selector settings for env {} from {:?}", env_name, config_dir);
        Ok(settings)
    }
}
