//! Command-line interface for the star map pipeline.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::core::loaders::{CatalogSource, CsvCatalog, StarTable};
use crate::core::writers;
use crate::processors::pipeline::{CoordinatePipeline, PreparedCatalog, SceneView};
use crate::processors::presets::{ScalePreset, Selection};
use crate::PipelineConfig;

#[derive(Parser)]
#[command(name = "starmap")]
#[command(about = "Star catalog to 3D map pipeline", version)]
pub struct Cli {
    /// Path to YAML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the catalog and sampling config, shared by every command
/// that reads a catalog.
#[derive(clap::Args, Clone, Debug, Default)]
struct CatalogArgs {
    /// Keep negative parallaxes (signed-inverse distances)
    #[arg(long)]
    allow_negative_parallax: bool,

    /// Drop stars at or beyond this distance in parsecs
    #[arg(long)]
    max_distance: Option<f64>,

    /// Seed for presets that subsample the catalog
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline for one scale preset
    View {
        /// Star catalog CSV with l, b, parallax columns
        catalog: PathBuf,
        /// Scale preset
        #[arg(short, long, value_enum, default_value_t = ScalePreset::MilkyWay)]
        scale: ScalePreset,
        /// Write the view to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        catalog_args: CatalogArgs,
    },

    /// Write one view CSV per scale preset
    ExportAll {
        /// Star catalog CSV with l, b, parallax columns
        catalog: PathBuf,
        /// Output directory for the view CSVs
        output_dir: PathBuf,
        #[command(flatten)]
        catalog_args: CatalogArgs,
    },

    /// List the scale presets
    Presets,

    /// Plot galactic longitude vs latitude colored by distance (PNG)
    SkyMap {
        /// Star catalog CSV with l, b, parallax columns
        catalog: PathBuf,
        /// Output PNG file path (defaults to the catalog name with .png)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum number of stars to plot
        #[arg(long, default_value_t = 200_000)]
        max_points: usize,
        #[command(flatten)]
        catalog_args: CatalogArgs,
    },

    /// Plot a scale preset view from above (PNG)
    Plot {
        /// Star catalog CSV with l, b, parallax columns
        catalog: PathBuf,
        /// Scale preset
        #[arg(short, long, value_enum, default_value_t = ScalePreset::MilkyWay)]
        scale: ScalePreset,
        /// Output PNG file path (defaults to <catalog>_<preset>.png)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[command(flatten)]
        catalog_args: CatalogArgs,
    },
}

/// Create a spinner for indeterminate operations
fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Print a summary box
fn print_summary(title: &str, items: &[(&str, String)]) {
    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║ {:<62} ║", title);
    println!("╠══════════════════════════════════════════════════════════════╣");
    for (key, value) in items {
        let display_value = if value.chars().count() > 39 {
            format!("{}...", value.chars().take(36).collect::<String>())
        } else {
            value.clone()
        };
        println!("║ {:<20}: {:<39} ║", key, display_value);
    }
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
}

pub fn run() {
    let cli = Cli::parse();

    // Initialize logging based on verbosity (must come first)
    env_logger::Builder::new()
        .filter_level(match cli.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .format_timestamp_secs()
        .init();

    // Load config
    let config = match &cli.config {
        Some(path) => match PipelineConfig::from_yaml(path) {
            Ok(cfg) => {
                info!("Loaded config from: {}", path.display());
                cfg
            }
            Err(e) => {
                warn!("Failed to load config from {}: {}, using defaults", path.display(), e);
                PipelineConfig::default()
            }
        },
        None => PipelineConfig::default(),
    };

    match cli.command {
        Commands::View { catalog, scale, output, catalog_args } => {
            cmd_view(&catalog, scale, output.as_deref(), &apply_overrides(&config, &catalog_args));
        }
        Commands::ExportAll { catalog, output_dir, catalog_args } => {
            cmd_export_all(&catalog, &output_dir, &apply_overrides(&config, &catalog_args));
        }
        Commands::Presets => cmd_presets(),
        Commands::SkyMap { catalog, output, max_points, catalog_args } => {
            cmd_sky_map(&catalog, output, max_points, &apply_overrides(&config, &catalog_args));
        }
        Commands::Plot { catalog, scale, output, catalog_args } => {
            cmd_plot(&catalog, scale, output, &apply_overrides(&config, &catalog_args));
        }
    }
}

/// CLI flags win over the config file; unset flags leave it alone.
fn apply_overrides(config: &PipelineConfig, args: &CatalogArgs) -> PipelineConfig {
    let mut config = config.clone();
    if args.allow_negative_parallax {
        config.catalog.allow_negative_parallax = true;
    }
    if args.max_distance.is_some() {
        config.catalog.max_distance_pc = args.max_distance;
    }
    if args.seed.is_some() {
        config.sampling.seed = args.seed;
    }
    config
}

/// Load and prepare a catalog, or exit with an error.
fn load_prepared(catalog: &Path, pipeline: &CoordinatePipeline) -> PreparedCatalog {
    let spinner = create_spinner("Loading star catalog...");

    let source = CsvCatalog::new(catalog);
    let raw: StarTable = match source.load() {
        Ok(table) => table,
        Err(e) => {
            spinner.finish_and_clear();
            error!("Failed to load catalog: {}", e);
            std::process::exit(1);
        }
    };

    spinner.set_message("Computing galactic coordinates...");

    match pipeline.prepare(&raw) {
        Ok(prepared) => {
            spinner.finish_and_clear();
            prepared
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Invalid catalog {}: {}", catalog.display(), e);
            std::process::exit(1);
        }
    }
}

fn catalog_stem(catalog: &Path) -> String {
    catalog
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "catalog".to_string())
}

fn view_summary_items(catalog: &Path, scene: &SceneView) -> Vec<(&'static str, String)> {
    let stats = &scene.stats;
    vec![
        ("Catalog", catalog.display().to_string()),
        ("Scale", scene.label.to_string()),
        ("Input rows", stats.clean.input_rows.to_string()),
        ("Missing values", stats.clean.missing_values.to_string()),
        ("Undefined distance", stats.clean.undefined_distance.to_string()),
        ("Placed stars", stats.placed.to_string()),
        ("Stars shown", stats.visible.to_string()),
        (
            "Camera eye",
            format!("({}, {}, {})", scene.camera.x, scene.camera.y, scene.camera.z),
        ),
    ]
}

fn cmd_view(catalog: &Path, scale: ScalePreset, output: Option<&Path>, config: &PipelineConfig) {
    let start = Instant::now();
    let pipeline = CoordinatePipeline::new(config.clone());
    let prepared = load_prepared(catalog, &pipeline);

    let scene = pipeline.view_with_config(&prepared, scale);
    if scene.is_empty() {
        warn!("No stars visible at scale {}", scene.label);
    }

    let mut items = view_summary_items(catalog, &scene);

    if let Some(path) = output {
        match writers::write_view_csv(path, &scene) {
            Ok(rows) => items.push(("Output CSV", format!("{} ({} rows)", path.display(), rows))),
            Err(e) => {
                error!("Failed to write view: {}", e);
                std::process::exit(1);
            }
        }
    }

    items.push(("Duration", format!("{:.2?}", start.elapsed())));
    print_summary("View Complete", &items);
    println!("{}", scene.caption());
}

fn cmd_export_all(catalog: &Path, output_dir: &Path, config: &PipelineConfig) {
    let start = Instant::now();
    let pipeline = CoordinatePipeline::new(config.clone());
    let prepared = load_prepared(catalog, &pipeline);
    let stem = catalog_stem(catalog);

    let spinner = create_spinner("Exporting every scale preset...");

    // Each preset is an independent pure view of the same prepared catalog
    let results: Vec<(ScalePreset, PathBuf, Result<usize, writers::WriteError>)> = ScalePreset::ALL
        .par_iter()
        .map(|&preset| {
            let scene = pipeline.view_with_config(&prepared, preset);
            let path = output_dir.join(format!("{}_{}.csv", stem, preset.slug()));
            let written = writers::write_view_csv(&path, &scene);
            (preset, path, written)
        })
        .collect();

    spinner.finish_and_clear();

    let mut items = vec![("Catalog", catalog.display().to_string())];
    let mut failed = false;
    for (preset, path, written) in &results {
        match written {
            Ok(rows) => {
                info!("{} -> {}", preset.label(), path.display());
                items.push((preset.label(), format!("{} stars", rows)));
            }
            Err(e) => {
                error!("Failed to write {}: {}", preset.label(), e);
                failed = true;
            }
        }
    }
    items.push(("Output directory", output_dir.display().to_string()));
    items.push(("Duration", format!("{:.2?}", start.elapsed())));

    print_summary("Export Complete", &items);

    if failed {
        std::process::exit(1);
    }
}

fn cmd_presets() {
    println!(
        "{:<22} {:<16} {:<20} {:>6} {:>8}",
        "Preset", "Selection", "Camera eye", "Size", "Opacity"
    );
    for preset in ScalePreset::ALL {
        let spec = preset.spec();
        let selection = match spec.selection {
            Selection::Within(cutoff) => format!("r < {} pc", cutoff),
            Selection::Everything => "all".to_string(),
            Selection::Sample(max) => format!("sample {}", max),
        };
        let camera = format!("({}, {}, {})", spec.camera.x, spec.camera.y, spec.camera.z);
        println!(
            "{:<22} {:<16} {:<20} {:>6} {:>8}",
            spec.label, selection, camera, spec.base_size, spec.base_opacity
        );
    }
}

fn cmd_sky_map(catalog: &Path, output: Option<PathBuf>, max_points: usize, config: &PipelineConfig) {
    use crate::visualization;

    let start = Instant::now();
    let output_path = output.unwrap_or_else(|| catalog.with_extension("png"));

    let pipeline = CoordinatePipeline::new(config.clone());
    let prepared = load_prepared(catalog, &pipeline);
    if prepared.stars.is_empty() {
        warn!("No stars left after cleaning, drawing an empty sky map");
    }

    let spinner = create_spinner("Drawing sky map...");
    match visualization::plot_sky_map(&output_path, &prepared.stars, max_points) {
        Ok(()) => {
            spinner.finish_and_clear();
            print_summary(
                "Sky Map Complete",
                &[
                    ("Catalog", catalog.display().to_string()),
                    ("Output PNG", output_path.display().to_string()),
                    ("Stars", prepared.stars.len().to_string()),
                    ("Duration", format!("{:.2?}", start.elapsed())),
                ],
            );
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Sky map failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn cmd_plot(catalog: &Path, scale: ScalePreset, output: Option<PathBuf>, config: &PipelineConfig) {
    use crate::visualization;

    let start = Instant::now();
    let output_path = output.unwrap_or_else(|| {
        catalog.with_file_name(format!("{}_{}.png", catalog_stem(catalog), scale.slug()))
    });

    let pipeline = CoordinatePipeline::new(config.clone());
    let prepared = load_prepared(catalog, &pipeline);
    let scene = pipeline.view_with_config(&prepared, scale);
    if scene.is_empty() {
        warn!("No stars visible at scale {}, drawing an empty view", scene.label);
    }

    let spinner = create_spinner("Drawing view...");
    match visualization::plot_scene(&output_path, &scene) {
        Ok(()) => {
            spinner.finish_and_clear();
            let mut items = view_summary_items(catalog, &scene);
            items.push(("Output PNG", output_path.display().to_string()));
            items.push(("Duration", format!("{:.2?}", start.elapsed())));
            print_summary("Plot Complete", &items);
            println!("{}", scene.caption());
        }
        Err(e) => {
            spinner.finish_and_clear();
            error!("Plot failed: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_view_command() {
        let cli = Cli::try_parse_from([
            "starmap",
            "-vv",
            "view",
            "gaia_sample.csv",
            "--scale",
            "solar-neighborhood",
            "--seed",
            "3",
            "--allow-negative-parallax",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::View { catalog, scale, output, catalog_args } => {
                assert_eq!(catalog, PathBuf::from("gaia_sample.csv"));
                assert_eq!(scale, ScalePreset::SolarNeighborhood);
                assert!(output.is_none());
                assert_eq!(catalog_args.seed, Some(3));
                assert!(catalog_args.allow_negative_parallax);
            }
            _ => panic!("expected view command"),
        }
    }

    #[test]
    fn test_overrides_only_touch_set_flags() {
        let mut config = PipelineConfig::default();
        config.catalog.max_distance_pc = Some(5000.0);
        config.sampling.seed = Some(1);

        let unchanged = apply_overrides(&config, &CatalogArgs::default());
        assert_eq!(unchanged.catalog.max_distance_pc, Some(5000.0));
        assert_eq!(unchanged.sampling.seed, Some(1));
        assert!(!unchanged.catalog.allow_negative_parallax);

        let args = CatalogArgs {
            allow_negative_parallax: true,
            max_distance: Some(100.0),
            seed: Some(9),
        };
        let changed = apply_overrides(&config, &args);
        assert!(changed.catalog.allow_negative_parallax);
        assert_eq!(changed.catalog.max_distance_pc, Some(100.0));
        assert_eq!(changed.sampling.seed, Some(9));
    }

    #[test]
    fn test_catalog_stem() {
        assert_eq!(catalog_stem(Path::new("data/gaia_sample.csv")), "gaia_sample");
    }
}
