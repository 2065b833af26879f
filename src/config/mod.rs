//! Configuration types for the star map pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for reading and cleaning the star catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Keep negative parallaxes (signed-inverse distances) instead of
    /// dropping every non-positive parallax.
    #[serde(default)]
    pub allow_negative_parallax: bool,

    /// Optional distance cap in parsecs; stars at or beyond it are dropped.
    #[serde(default)]
    pub max_distance_pc: Option<f64>,
}

/// Configuration for presets that subsample the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Fixed RNG seed. Unseeded runs draw a fresh sample every time.
    #[serde(default)]
    pub seed: Option<u64>,
}

/// Clamp ranges for per-star rendering hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualConfig {
    /// Smallest marker size emitted
    #[serde(default = "default_min_size")]
    pub min_size: f64,

    /// Largest marker size emitted
    #[serde(default = "default_max_size")]
    pub max_size: f64,

    /// Smallest opacity emitted
    #[serde(default = "default_min_opacity")]
    pub min_opacity: f64,

    /// Largest opacity emitted
    #[serde(default = "default_max_opacity")]
    pub max_opacity: f64,
}

fn default_min_size() -> f64 {
    0.5
}

fn default_max_size() -> f64 {
    6.0
}

fn default_min_opacity() -> f64 {
    0.05
}

fn default_max_opacity() -> f64 {
    1.0
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            min_size: default_min_size(),
            max_size: default_max_size(),
            min_opacity: default_min_opacity(),
            max_opacity: default_max_opacity(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub visuals: VisualConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
