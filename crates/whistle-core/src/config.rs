//! # Dispatcher Configuration
//!
//! [`DispatcherConfig`] tunes how strict a dispatcher is. Every field has a
//! default, so an empty document is a valid configuration. Configurations can
//! be parsed from JSON, TOML (feature `toml-config`) or YAML (feature
//! `yaml-config`).
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::{MAX_PRIORITY, MIN_PRIORITY, Priority};

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON format (.json)
    Json,
    /// YAML format (.yaml, .yml) - requires "yaml-config" feature
    #[cfg(feature = "yaml-config")]
    Yaml,
    /// TOML format (.toml) - requires "toml-config" feature
    #[cfg(feature = "toml-config")]
    Toml,
}

impl ConfigFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => "yaml",
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => "toml",
        }
    }

    /// Determine format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "json" => Some(ConfigFormat::Json),
                #[cfg(feature = "yaml-config")]
                "yaml" | "yml" => Some(ConfigFormat::Yaml),
                #[cfg(feature = "toml-config")]
                "toml" => Some(ConfigFormat::Toml),
                _ => None,
            })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format:?} configuration: {message}")]
    Parse { format: ConfigFormat, message: String },

    #[error("Unknown or unsupported config format for path: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Invalid priority range: min {min} is greater than max {max}")]
    InvalidPriorityRange { min: Priority, max: Priority },
}

/// Inclusive bounds for listener priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityRange {
    pub min: Priority,
    pub max: Priority,
}

impl PriorityRange {
    pub fn contains(&self, priority: Priority) -> bool {
        (self.min..=self.max).contains(&priority)
    }
}

impl Default for PriorityRange {
    fn default() -> Self {
        Self {
            min: MIN_PRIORITY,
            max: MAX_PRIORITY,
        }
    }
}

/// Dispatcher behaviour switches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Reject registrations whose priority falls outside `priority_range`
    pub enforce_priority_range: bool,
    pub priority_range: PriorityRange,
    /// Make the async entry points of a synchronous dispatcher fail instead
    /// of running listeners inline
    pub strict_async_bridge: bool,
}

impl DispatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enforce_priority_range(mut self, range: PriorityRange) -> Self {
        self.enforce_priority_range = true;
        self.priority_range = range;
        self
    }

    pub fn strict_async_bridge(mut self, strict: bool) -> Self {
        self.strict_async_bridge = strict;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let PriorityRange { min, max } = self.priority_range;
        if min > max {
            return Err(ConfigError::InvalidPriorityRange { min, max });
        }
        Ok(())
    }

    /// Parse and validate a configuration document
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse { format, message };
        let config: Self = match format {
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => {
                serde_yaml::from_str(content).map_err(|e| parse_error(e.to_string()))?
            }
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, picking the format from its extension
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        })?;
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loading dispatcher configuration from {}", path.display());
        Self::parse(&content, format)
    }

    /// Serialize to string based on format
    pub fn serialize(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        let parse_error = |message: String| ConfigError::Parse { format, message };
        match format {
            ConfigFormat::Json => {
                serde_json::to_string_pretty(self).map_err(|e| parse_error(e.to_string()))
            }
            #[cfg(feature = "yaml-config")]
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| parse_error(e.to_string())),
            #[cfg(feature = "toml-config")]
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| parse_error(e.to_string()))
            }
        }
    }
}
