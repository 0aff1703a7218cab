//! Tunables for throttling, views and export.
//!
//! Every struct has a `Default` with the values the labeling tool ships with;
//! a JSON file only needs to name the fields it overrides.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::annotation::ViewFilter;
use crate::error::ConfigError;

/// Configuration for the frame throttle.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Side of the square grayscale thumbnail compared between frames.
    pub thumbnail_size: u32,
    /// Mean absolute intensity difference (0-255) below which a frame is a
    /// near-duplicate.
    pub threshold: f32,
    /// Only every Nth frame is considered while playing at elevated speed.
    pub elevated_every_n: u32,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            thumbnail_size: 64,
            threshold: 2.0,
            elevated_every_n: 2,
        }
    }
}

/// Configuration for dataset export.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Fraction of frames, in order, that go to the train split.
    pub train_ratio: f64,
    /// Extension of images decoded from video.
    pub image_extension: String,
    pub manifest_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            train_ratio: 0.8,
            image_extension: "jpg".to_string(),
            manifest_name: "dataset.yaml".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dedup: DedupConfig,
    pub view: ViewFilter,
    pub export: ExportConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dedup.thumbnail_size == 0 {
            return Err(ConfigError::Invalid("dedup.thumbnail_size must be > 0".into()));
        }
        if !(self.dedup.threshold >= 0.0 && self.dedup.threshold <= 255.0) {
            return Err(ConfigError::Invalid(format!(
                "dedup.threshold {} outside [0, 255]",
                self.dedup.threshold
            )));
        }
        if self.dedup.elevated_every_n == 0 {
            return Err(ConfigError::Invalid("dedup.elevated_every_n must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.view.min_confidence) {
            return Err(ConfigError::Invalid(format!(
                "view.min_confidence {} outside [0, 1]",
                self.view.min_confidence
            )));
        }
        if !(self.export.train_ratio > 0.0 && self.export.train_ratio <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "export.train_ratio {} outside (0, 1]",
                self.export.train_ratio
            )));
        }
        if self.export.image_extension.is_empty() {
            return Err(ConfigError::Invalid("export.image_extension is empty".into()));
        }
        Ok(())
    }
}
