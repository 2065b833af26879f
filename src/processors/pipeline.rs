//! The coordinate pipeline: raw catalog in, scale-preset view out.
//!
//! Stages run in a fixed order:
//!
//! 1. `clean`: schema check, blank values, undefined distances
//! 2. `locate`: distance, Cartesian position, radius, optional distance cap
//! 3. `select_view`: preset radius cut or bounded sample
//! 4. `visual_attributes`: marker size and opacity
//!
//! Stages 1-2 depend only on the catalog and config, so a caller rendering
//! several presets can run them once with [`CoordinatePipeline::prepare`]
//! and call [`CoordinatePipeline::view`] per preset.

use log::{debug, info};
use thiserror::Error;

use crate::config::PipelineConfig;
use crate::core::loaders::{CatalogSource, DataSourceError, StarTable};
use crate::core::transforms::{self, CleanStats, PlacedStar, TransformError};

use super::presets::{CameraEye, ScalePreset};
use super::view::{self, Sampler, ViewStar};

/// Errors that stop a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The catalog schema lacks a required column.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// The catalog could not be read.
    #[error("Data source error: {0}")]
    DataSource(#[from] DataSourceError),
}

impl PipelineError {
    /// Name of the missing column, for `MissingColumn` failures.
    pub fn missing_column(&self) -> Option<&str> {
        match self {
            PipelineError::Transform(TransformError::MissingColumn(column)) => Some(column.as_str()),
            _ => None,
        }
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// A catalog after cleaning and placement, ready for any preset.
#[derive(Debug, Clone, Default)]
pub struct PreparedCatalog {
    pub stars: Vec<PlacedStar>,
    pub clean_stats: CleanStats,
    /// Names of the pass-through cells carried by each star.
    pub passthrough_columns: Vec<String>,
}

impl PreparedCatalog {
    /// Rows removed by the distance cap.
    pub fn capped(&self) -> usize {
        self.clean_stats.retained - self.stars.len()
    }
}

/// Row counts through the stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub clean: CleanStats,
    pub placed: usize,
    pub visible: usize,
}

/// Output handed to a rendering front end.
#[derive(Debug, Clone)]
pub struct SceneView {
    pub preset: ScalePreset,
    pub label: &'static str,
    pub camera: CameraEye,
    pub stars: Vec<ViewStar>,
    pub passthrough_columns: Vec<String>,
    pub stats: PipelineStats,
}

impl SceneView {
    #[inline]
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    /// True when no star is visible; front ends should draw an empty scene.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// One-line caption, e.g. `Scale: Milky Way • Stars shown: 1200`.
    pub fn caption(&self) -> String {
        format!("Scale: {} • Stars shown: {}", self.label, self.len())
    }
}

/// Stateless pipeline configured once and run on any number of catalogs.
#[derive(Debug, Clone, Default)]
pub struct CoordinatePipeline {
    config: PipelineConfig,
}

impl CoordinatePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Clean and place a raw catalog.
    ///
    /// # Errors
    ///
    /// Fails with a missing-column error before any row is processed if the
    /// schema lacks `l`, `b` or `parallax`.
    pub fn prepare(&self, raw: &StarTable) -> Result<PreparedCatalog> {
        let allow_negative = self.config.catalog.allow_negative_parallax;

        let (clean, clean_stats) = transforms::clean_with_stats(raw, allow_negative)?;
        let stars = transforms::locate(&clean, allow_negative, self.config.catalog.max_distance_pc);

        info!(
            "Prepared catalog: {} input rows, {} clean, {} placed",
            clean_stats.input_rows,
            clean_stats.retained,
            stars.len()
        );

        Ok(PreparedCatalog {
            stars,
            clean_stats,
            passthrough_columns: raw
                .passthrough_columns()
                .into_iter()
                .map(String::from)
                .collect(),
        })
    }

    /// Select and decorate the view of a prepared catalog for one preset.
    pub fn view(
        &self,
        prepared: &PreparedCatalog,
        preset: ScalePreset,
        sampler: &mut Sampler,
    ) -> SceneView {
        let spec = preset.spec();
        let (selected, camera) = view::select_view(&prepared.stars, preset, sampler);
        let stars = view::visual_attributes(selected, spec, &self.config.visuals);

        debug!("{}: {} of {} stars visible", spec.label, stars.len(), prepared.stars.len());

        SceneView {
            preset,
            label: spec.label,
            camera,
            passthrough_columns: prepared.passthrough_columns.clone(),
            stats: PipelineStats {
                clean: prepared.clean_stats,
                placed: prepared.stars.len(),
                visible: stars.len(),
            },
            stars,
        }
    }

    /// [`view`](Self::view) with a sampler built from the sampling config.
    pub fn view_with_config(&self, prepared: &PreparedCatalog, preset: ScalePreset) -> SceneView {
        let mut sampler = Sampler::from_config(&self.config.sampling);
        self.view(prepared, preset, &mut sampler)
    }

    /// Run every stage on a raw catalog.
    pub fn run(&self, raw: &StarTable, preset: ScalePreset) -> Result<SceneView> {
        let prepared = self.prepare(raw)?;
        Ok(self.view_with_config(&prepared, preset))
    }

    /// Load from `source`, then [`run`](Self::run).
    pub fn run_source<S: CatalogSource + ?Sized>(
        &self,
        source: &S,
        preset: ScalePreset,
    ) -> Result<SceneView> {
        let raw = source.load()?;
        self.run(&raw, preset)
    }
}
