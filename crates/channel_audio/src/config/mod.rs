//! Configuration system
//!
//! Audio settings are plain serde structs persisted as TOML or RON, picked by
//! file extension.

pub use serde::{Deserialize, Serialize};

use crate::audio::backend::AudioBackendConfig;
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            ConfigFormat::Ron => {
                ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
            }
        }
    }

    /// Save configuration to file
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match ConfigFormat::from_path(path)? {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// On-disk formats understood by [`Config`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Toml,
    Ron,
}

impl ConfigFormat {
    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its accepted range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// # Audio Configuration
///
/// Settings for the channel registry and the output backend it opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Master gain applied to every handle (0.0 to 1.0)
    pub global_volume: f32,
    /// Run garbage collection every N calls to `tick()`
    pub gc_interval_ticks: u32,
    /// Log level used by hosts that initialise logging from this config
    pub log_level: String,
    /// Output backend settings
    pub backend: AudioBackendConfig,
}

impl AudioConfig {
    /// Create a new audio configuration with defaults
    pub fn new() -> Self {
        Self {
            global_volume: 1.0,
            gc_interval_ticks: 1,
            log_level: "info".to_string(),
            backend: AudioBackendConfig::default(),
        }
    }

    /// Set the initial global volume
    pub fn with_global_volume(mut self, volume: f32) -> Self {
        self.global_volume = volume;
        self
    }

    /// Set how many ticks pass between garbage collection passes
    pub fn with_gc_interval(mut self, ticks: u32) -> Self {
        self.gc_interval_ticks = ticks;
        self
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Set backend configuration
    pub fn with_backend(mut self, backend: AudioBackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.global_volume) {
            return Err(ConfigError::Invalid(format!(
                "global_volume must be within 0.0..=1.0, got {}",
                self.global_volume
            )));
        }

        if self.gc_interval_ticks == 0 {
            return Err(ConfigError::Invalid(
                "gc_interval_ticks must be at least 1".to_string(),
            ));
        }

        if self.backend.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate cannot be zero".to_string()));
        }

        if self.backend.channels == 0 {
            return Err(ConfigError::Invalid("channels cannot be zero".to_string()));
        }

        Ok(())
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for AudioConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(AudioConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_out_of_range() {
        let loud = AudioConfig::new().with_global_volume(1.5);
        assert!(matches!(loud.validate(), Err(ConfigError::Invalid(_))));

        let never_collect = AudioConfig::new().with_gc_interval(0);
        assert!(matches!(never_collect.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.toml");

        let config = AudioConfig::new()
            .with_global_volume(0.25)
            .with_gc_interval(4)
            .with_log_level("debug");
        config.save_to_file(&path).unwrap();

        let loaded = AudioConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.ron");

        let config = AudioConfig::new().with_global_volume(0.75);
        config.save_to_file(&path).unwrap();

        let loaded = AudioConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.toml");
        std::fs::write(&path, "global_volume = 0.5\n").unwrap();

        let loaded = AudioConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.global_volume, 0.5);
        assert_eq!(loaded.gc_interval_ticks, 1);
        assert_eq!(loaded.backend, AudioBackendConfig::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audio.json");

        let result = AudioConfig::default().save_to_file(&path);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
