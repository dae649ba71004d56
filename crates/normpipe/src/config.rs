//! Configuration for the normpipe CLI
//!
//! Provides:
//! - Config file discovery (CLI flag, env var, standard paths)
//! - TOML parsing with serde
//! - Environment variable overrides

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeConfig {
    /// Pipeline-wide settings
    pub pipeline: PipelineSettings,

    /// Batch processor settings
    pub processor: ProcessorSettings,
}

/// Pipeline-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Batch processor settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorSettings {
    /// Recover JSON blocks from payloads that fail whole-text parsing
    pub salvage_json: bool,
}

impl PipeConfig {
    /// Load configuration with the following precedence:
    /// 1. CLI `--config` flag (the `NORMPIPE_CONFIG` env var feeds the same
    ///    flag through clap)
    /// 2. ~/.config/normpipe/config.toml
    /// 3. /etc/normpipe/config.toml
    /// 4. Default values
    pub fn load(cli_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match find_config_file(cli_path) {
            Some(path) => {
                info!("Loading configuration from: {}", path.display());
                let content = std::fs::read_to_string(&path)?;
                toml::from_str(&content)?
            }
            None => {
                debug!("No config file found, using defaults");
                Self::default()
            }
        };
        apply_env_overrides(&mut config);
        validate(&config)?;
        Ok(config)
    }
}

/// Find the config file to use
fn find_config_file(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        if path.exists() {
            return Some(path.to_path_buf());
        }
        warn!("Config path does not exist: {}", path.display());
    }

    if let Some(path) = user_config_file() {
        if path.exists() {
            return Some(path);
        }
    }

    #[cfg(unix)]
    {
        let path = PathBuf::from("/etc/normpipe/config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    None
}

/// The per-user config path, honoring XDG on Linux
fn user_config_file() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;
    Some(base.join("normpipe").join("config.toml"))
}

/// Apply environment variable overrides
fn apply_env_overrides(config: &mut PipeConfig) {
    if let Ok(val) = std::env::var("NORMPIPE_LOG_LEVEL") {
        config.pipeline.log_level = val;
    }
    if let Ok(val) = std::env::var("NORMPIPE_SALVAGE_JSON") {
        config.processor.salvage_json = val.parse().unwrap_or(config.processor.salvage_json);
    }
}

/// Validate configuration
fn validate(config: &PipeConfig) -> Result<(), ConfigError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.pipeline.log_level.to_lowercase().as_str()) {
        return Err(ConfigError::ValidationError(format!(
            "Invalid log level: {}. Must be one of: {:?}",
            config.pipeline.log_level, valid_levels
        )));
    }
    Ok(())
}
