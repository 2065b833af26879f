//! PNG previews of catalogs and scene views.
//!
//! Two plots, both drawn with the plotters bitmap backend on a black
//! background:
//! - a sky map of galactic longitude vs latitude, colored by signed distance
//! - a top-down (x, y) view of a preset, using each star's visual size and
//!   opacity, colored by radius
//!
//! No text is drawn, so no font support is required.

use std::path::Path;

use plotters::prelude::*;
use plotters_bitmap::BitMapBackend;
use thiserror::Error;

use crate::core::transforms::PlacedStar;
use crate::processors::pipeline::SceneView;

/// Errors that can occur during visualization.
#[derive(Error, Debug)]
pub enum VisualizationError {
    #[error("Plotting error: {0}")]
    PlottingError(String),
}

/// Result type for visualization operations.
pub type Result<T> = std::result::Result<T, VisualizationError>;

/// Default plot width in pixels.
const DEFAULT_WIDTH: u32 = 1920;

/// Default plot height in pixels.
const DEFAULT_HEIGHT: u32 = 1080;

/// Inferno-like gradient stops, dark to bright.
const GRADIENT: &[(u8, u8, u8)] = &[
    (0, 0, 4),
    (40, 11, 84),
    (101, 21, 110),
    (159, 42, 99),
    (212, 72, 66),
    (245, 125, 21),
    (250, 193, 39),
    (252, 255, 164),
];

/// Marker at the origin standing in for the Sun.
const ORIGIN_COLOR: RGBColor = RGBColor(255, 255, 255);

/// Pixels per unit of `visual_size`.
const SIZE_TO_PIXELS: f64 = 1.5;

fn plot_err<E: std::fmt::Display>(e: E) -> VisualizationError {
    VisualizationError::PlottingError(e.to_string())
}

/// Map `t` in `[0, 1]` onto the gradient.
fn gradient_color(t: f64) -> (u8, u8, u8) {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (GRADIENT.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(GRADIENT.len() - 2);
    let frac = scaled - i as f64;

    let (r0, g0, b0) = GRADIENT[i];
    let (r1, g1, b1) = GRADIENT[i + 1];
    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;

    (lerp(r0, r1), lerp(g0, g1), lerp(b0, b1))
}

/// Normalize `value` into `[0, 1]` over `[min, max]`.
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if max - min > f64::EPSILON {
        (value - min) / (max - min)
    } else {
        0.5
    }
}

/// Compute x/y bounds, widening degenerate ranges.
fn compute_bounds(points: impl Iterator<Item = (f64, f64)>) -> (f64, f64, f64, f64) {
    let mut x_min = f64::MAX;
    let mut x_max = f64::MIN;
    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;

    for (x, y) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if (x_max - x_min).abs() < f64::EPSILON {
        x_min -= 1.0;
        x_max += 1.0;
    }
    if (y_max - y_min).abs() < f64::EPSILON {
        y_min -= 1.0;
        y_max += 1.0;
    }

    (x_min, x_max, y_min, y_max)
}

/// Plot galactic longitude vs latitude, colored by distance, and save as PNG.
///
/// At most `max_points` stars are drawn, picked with a regular stride. An
/// empty slice gives an empty sky.
pub fn plot_sky_map(output_path: &Path, stars: &[PlacedStar], max_points: usize) -> Result<()> {
    let step = sky_map_stride(stars.len(), max_points);

    let (d_min, d_max) = distance_range(stars);

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();
    root.fill(&BLACK).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(0.0f64..360.0f64, -90.0f64..90.0f64)
        .map_err(plot_err)?;

    chart
        .draw_series(stars.iter().step_by(step).map(|s| {
            let (r, g, b) = gradient_color(normalize(s.distance_pc, d_min, d_max));
            Circle::new((s.l.rem_euclid(360.0), s.b), 2, RGBAColor(r, g, b, 0.6).filled())
        }))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Smallest and largest signed distance.
fn distance_range(stars: &[PlacedStar]) -> (f64, f64) {
    stars.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
        (lo.min(s.distance_pc), hi.max(s.distance_pc))
    })
}

/// Stride that keeps at most `max_points` of `len` items.
fn sky_map_stride(len: usize, max_points: usize) -> usize {
    len.div_ceil(max_points.max(1)).max(1)
}

/// Plot a scene view from above (x vs y) and save as PNG.
///
/// Marker size and opacity come from the view's visual attributes; the Sun
/// is drawn at the origin. An empty view draws only the Sun.
pub fn plot_scene(output_path: &Path, scene: &SceneView) -> Result<()> {
    let (r_min, r_max) = scene.stars.iter().fold((f64::MAX, f64::MIN), |(lo, hi), s| {
        (lo.min(s.star.radius), hi.max(s.star.radius))
    });

    let (x_min, x_max, y_min, y_max) = compute_bounds(
        scene
            .stars
            .iter()
            .map(|s| (s.star.x, s.star.y))
            .chain(std::iter::once((0.0, 0.0))),
    );
    let x_padding = (x_max - x_min) * 0.05;
    let y_padding = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (DEFAULT_WIDTH, DEFAULT_HEIGHT)).into_drawing_area();
    root.fill(&BLACK).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(
            (x_min - x_padding)..(x_max + x_padding),
            (y_min - y_padding)..(y_max + y_padding),
        )
        .map_err(plot_err)?;

    chart
        .draw_series(scene.stars.iter().map(|s| {
            let (r, g, b) = gradient_color(normalize(s.star.radius, r_min, r_max));
            let pixels = (s.visual_size * SIZE_TO_PIXELS).round().max(1.0) as i32;
            Circle::new(
                (s.star.x, s.star.y),
                pixels,
                RGBAColor(r, g, b, s.visual_opacity).filled(),
            )
        }))
        .map_err(plot_err)?;

    chart
        .draw_series(std::iter::once(Circle::new((0.0, 0.0), 8, ORIGIN_COLOR.mix(0.9).filled())))
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::{StarRow, StarTable};
    use crate::processors::pipeline::CoordinatePipeline;
    use crate::processors::presets::ScalePreset;
    use tempfile::TempDir;

    fn scene() -> SceneView {
        let raw = StarTable::from_rows(
            ["l", "b", "parallax"],
            (0..200)
                .map(|i| StarRow::complete(i as f64 * 1.8, (i % 60) as f64 - 30.0, 1.0 + i as f64 * 0.1))
                .collect(),
        );
        CoordinatePipeline::default()
            .run(&raw, ScalePreset::MilkyWay)
            .unwrap()
    }

    #[test]
    fn test_gradient_endpoints() {
        assert_eq!(gradient_color(0.0), GRADIENT[0]);
        assert_eq!(gradient_color(1.0), GRADIENT[GRADIENT.len() - 1]);
        assert_eq!(gradient_color(-3.0), GRADIENT[0]);
        assert_eq!(gradient_color(f64::NAN), GRADIENT[0]);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize(5.0, 5.0, 5.0), 0.5);
        assert_eq!(normalize(7.5, 5.0, 10.0), 0.5);
    }

    #[test]
    fn test_compute_bounds_widens_single_point() {
        let (x_min, x_max, y_min, y_max) = compute_bounds(std::iter::once((3.0, 4.0)));
        assert_eq!((x_min, x_max, y_min, y_max), (2.0, 4.0, 3.0, 5.0));
    }

    #[test]
    fn test_plot_scene_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("milky_way.png");

        plot_scene(&path, &scene()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_plot_sky_map_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sky.png");
        let stars: Vec<PlacedStar> = scene().stars.into_iter().map(|s| s.star).collect();

        plot_sky_map(&path, &stars, 50).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_sky_map_stride_caps_points() {
        assert_eq!(sky_map_stride(150, 100), 2);
        assert_eq!(150usize.div_ceil(sky_map_stride(150, 100)), 75);
        assert_eq!(sky_map_stride(200, 100), 2);
        assert_eq!(sky_map_stride(201, 100), 3);
        assert_eq!(sky_map_stride(50, 100), 1);
        assert_eq!(sky_map_stride(0, 100), 1);
        assert_eq!(sky_map_stride(10, 0), 10);
    }

    #[test]
    fn test_sky_map_colors_by_signed_distance() {
        let mut config = crate::config::PipelineConfig::default();
        config.catalog.allow_negative_parallax = true;
        let raw = StarTable::from_rows(
            ["l", "b", "parallax"],
            vec![StarRow::complete(0.0, 0.0, -2.0), StarRow::complete(90.0, 10.0, 4.0)],
        );
        let prepared = CoordinatePipeline::new(config).prepare(&raw).unwrap();

        assert_eq!(distance_range(&prepared.stars), (-500.0, 250.0));
    }

    #[test]
    fn test_empty_scene_writes_png() {
        let raw = StarTable::from_rows(["l", "b", "parallax"], vec![StarRow::complete(0.0, 0.0, 1.0)]);
        let scene = CoordinatePipeline::default()
            .run(&raw, ScalePreset::EarthVicinity)
            .unwrap();
        assert!(scene.is_empty());

        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.png");
        plot_scene(&path, &scene).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_sky_map_writes_png() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty_sky.png");

        plot_sky_map(&path, &[], 100).unwrap();
        assert!(path.exists());
    }
}
