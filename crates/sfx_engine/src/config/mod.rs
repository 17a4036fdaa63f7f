//! Configuration system

pub use serde::{Deserialize, Serialize};

use crate::audio::backend::AudioBackendConfig;
use crate::audio::cache::DEFAULT_MAX_CACHE_ENTRIES;
use crate::audio::mixer::SoundCategory;
use std::collections::BTreeMap;
use std::path::Path;

/// Default ceiling on simultaneously playing sound effects
pub const DEFAULT_MAX_CONCURRENT_SOUNDS: usize = 32;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
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

    /// Value out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Sound-effect system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundEffectsConfig {
    /// Maximum number of cached assets
    pub max_cache_entries: usize,
    /// Maximum number of simultaneously playing instances
    pub max_concurrent_sounds: usize,
    /// Initial master volume
    pub master_volume: f32,
    /// Initial per-category volumes; missing categories start at 1.0
    pub category_volumes: BTreeMap<SoundCategory, f32>,
    /// Seed for volume/pitch variation; `None` seeds from entropy
    pub variation_seed: Option<u64>,
    /// Native backend settings
    pub backend: AudioBackendConfig,
}

impl Default for SoundEffectsConfig {
    fn default() -> Self {
        Self {
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            max_concurrent_sounds: DEFAULT_MAX_CONCURRENT_SOUNDS,
            master_volume: 1.0,
            category_volumes: BTreeMap::new(),
            variation_seed: None,
            backend: AudioBackendConfig::default(),
        }
    }
}

impl Config for SoundEffectsConfig {}

impl SoundEffectsConfig {
    /// Set the cache capacity
    pub fn with_max_cache_entries(mut self, entries: usize) -> Self {
        self.max_cache_entries = entries;
        self
    }

    /// Set the concurrency ceiling
    pub fn with_max_concurrent_sounds(mut self, sounds: usize) -> Self {
        self.max_concurrent_sounds = sounds;
        self
    }

    /// Set the initial master volume
    pub fn with_master_volume(mut self, volume: f32) -> Self {
        self.master_volume = volume;
        self
    }

    /// Set the initial volume of one category
    pub fn with_category_volume(mut self, category: SoundCategory, volume: f32) -> Self {
        self.category_volumes.insert(category, volume);
        self
    }

    /// Seed the variation generator
    pub fn with_variation_seed(mut self, seed: u64) -> Self {
        self.variation_seed = Some(seed);
        self
    }

    /// Set the backend settings
    pub fn with_backend(mut self, backend: AudioBackendConfig) -> Self {
        self.backend = backend;
        self
    }

    /// Check capacities and volumes
    ///
    /// # Errors
    /// `ConfigError::Invalid` for a zero capacity or a volume outside 0.0..=1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cache_entries == 0 {
            return Err(ConfigError::Invalid("max_cache_entries must be at least 1".to_string()));
        }
        if self.max_concurrent_sounds == 0 {
            return Err(ConfigError::Invalid("max_concurrent_sounds must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.master_volume) {
            return Err(ConfigError::Invalid(format!(
                "master_volume {} is outside 0.0..=1.0",
                self.master_volume
            )));
        }
        for (category, volume) in &self.category_volumes {
            if !(0.0..=1.0).contains(volume) {
                return Err(ConfigError::Invalid(format!(
                    "{} volume {} is outside 0.0..=1.0",
                    category, volume
                )));
            }
        }
        Ok(())
    }
}
