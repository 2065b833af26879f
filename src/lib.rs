//! Star catalog to 3D map pipeline.
//!
//! This crate provides tools for:
//! - Loading star catalogs (galactic `l`, `b`, parallax) from CSV
//! - Cleaning rows and converting parallax to distance under an explicit
//!   negative-parallax policy
//! - Converting galactic spherical coordinates to heliocentric Cartesian
//! - Selecting a scale-preset view (radius cut or bounded random sample) with
//!   a camera hint and per-star marker size and opacity
//!
//! # Example
//!
//! ```no_run
//! use starmap_pipeline::{CoordinatePipeline, CsvCatalog, ScalePreset};
//!
//! let pipeline = CoordinatePipeline::default();
//! let scene = pipeline
//!     .run_source(&CsvCatalog::new("gaia_sample.csv"), ScalePreset::SolarNeighborhood)
//!     .unwrap();
//! println!("{}", scene.caption());
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{CatalogConfig, PipelineConfig, SamplingConfig, VisualConfig};
pub use crate::core::loaders::{CatalogSource, CsvCatalog, StarRow, StarTable};
pub use crate::core::CatalogCache;
pub use processors::pipeline::{CoordinatePipeline, PipelineError, SceneView};
pub use processors::presets::ScalePreset;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
