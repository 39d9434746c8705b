//! Loadable settings file bundling track and audio parameters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{AudioConfig, TrackConfig};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid settings: {0}")]
    Invalid(String),
}

/// Top-level settings (every section optional, defaults fill the gaps)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub track: TrackConfig,
    pub audio: AudioConfig,
}

impl Settings {
    /// Load and validate settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Parse and validate settings from TOML text
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.track.validate().map_err(ConfigError::Invalid)?;
        self.audio.validate().map_err(ConfigError::Invalid)?;
        Ok(())
    }
}
