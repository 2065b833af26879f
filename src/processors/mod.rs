//! Data processing modules.

pub mod pipeline;
pub mod presets;
pub mod view;

// Re-export key types for convenience
pub use pipeline::{CoordinatePipeline, PipelineError, PipelineStats, PreparedCatalog, SceneView};
pub use presets::{CameraEye, PresetSpec, ScalePreset, Selection};
pub use view::{select_view, visual_attributes, Sampler, ViewStar};
