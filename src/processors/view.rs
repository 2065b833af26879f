//! View selection and per-star rendering hints.

use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{SamplingConfig, VisualConfig};
use crate::core::transforms::PlacedStar;

use super::presets::{CameraEye, PresetSpec, ScalePreset, Selection};

/// A visible star with its rendering hints.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewStar {
    pub star: PlacedStar,
    /// Marker size, within the configured `[min_size, max_size]`.
    pub visual_size: f64,
    /// Marker opacity, within the configured `[min_opacity, max_opacity]`.
    pub visual_opacity: f64,
}

/// Random source for presets that subsample.
#[derive(Debug, Clone)]
pub struct Sampler {
    rng: ChaCha8Rng,
}

impl Sampler {
    /// Reproducible sampler.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Sampler seeded from the thread RNG; every instance draws differently.
    pub fn unseeded() -> Self {
        Self::seeded(rand::rng().random())
    }

    pub fn from_config(config: &SamplingConfig) -> Self {
        match config.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::unseeded(),
        }
    }

    /// `amount` distinct indices below `len`, ascending. Returns every index
    /// when `amount >= len`.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        if amount >= len {
            return (0..len).collect();
        }

        let mut picked = index::sample(&mut self.rng, len, amount).into_vec();
        // Keep source order
        picked.sort_unstable();
        picked
    }
}

/// Pick the visible rows for a preset and return them with its camera hint.
///
/// The result is always a subset of `stars` in their original order. Sampling
/// presets return `min(max_sample, stars.len())` distinct rows.
pub fn select_view(
    stars: &[PlacedStar],
    preset: ScalePreset,
    sampler: &mut Sampler,
) -> (Vec<PlacedStar>, CameraEye) {
    let spec = preset.spec();

    let view = match spec.selection {
        Selection::Within(cutoff) => stars
            .iter()
            .filter(|star| star.radius < cutoff)
            .cloned()
            .collect(),
        Selection::Everything => stars.to_vec(),
        Selection::Sample(max_sample) => sampler
            .sample_indices(stars.len(), max_sample)
            .into_iter()
            .map(|i| stars[i].clone())
            .collect(),
    };

    (view, spec.camera)
}

/// Falloff weight in `(0, 1]`: 1 at the Sun, 0.5 at `falloff_pc`.
#[inline]
pub fn falloff_weight(radius: f64, falloff_pc: f64) -> f64 {
    1.0 / (1.0 + radius.max(0.0) / falloff_pc)
}

/// Marker size for a star at `radius`. Non-increasing in `radius`.
pub fn visual_size(radius: f64, spec: &PresetSpec, visuals: &VisualConfig) -> f64 {
    let w = falloff_weight(radius, spec.falloff_pc);
    clamp_range(spec.base_size * (0.5 + w), visuals.min_size, visuals.max_size)
}

/// Marker opacity for a star at `radius`. Non-increasing in `radius`.
pub fn visual_opacity(radius: f64, spec: &PresetSpec, visuals: &VisualConfig) -> f64 {
    let w = falloff_weight(radius, spec.falloff_pc);
    clamp_range(
        spec.base_opacity * (0.5 + w),
        visuals.min_opacity,
        visuals.max_opacity,
    )
}

/// Attach size and opacity to every star of a view.
pub fn visual_attributes(
    view: Vec<PlacedStar>,
    spec: &PresetSpec,
    visuals: &VisualConfig,
) -> Vec<ViewStar> {
    view.into_iter()
        .map(|star| ViewStar {
            visual_size: visual_size(star.radius, spec, visuals),
            visual_opacity: visual_opacity(star.radius, spec, visuals),
            star,
        })
        .collect()
}

/// Like `f64::clamp`, but tolerates swapped bounds and maps NaN to the lower one.
fn clamp_range(value: f64, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if value.is_nan() {
        lo
    } else {
        value.max(lo).min(hi)
    }
}
