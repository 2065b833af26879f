//! CSV output for scene views.
//!
//! One row per visible star: the geometric columns a renderer needs first
//! (`x, y, z, radius, visual_size, visual_opacity`), then the source sky
//! position and distance, then every pass-through column.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use thiserror::Error;

use crate::processors::pipeline::SceneView;

/// Header of the fixed part of a view CSV.
pub const VIEW_COLUMNS: [&str; 10] = [
    "x",
    "y",
    "z",
    "radius",
    "visual_size",
    "visual_opacity",
    "l",
    "b",
    "parallax",
    "distance_pc",
];

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Write a scene view to a CSV file, creating parent directories as needed.
///
/// Returns the number of star rows written. An empty view still gets a header.
pub fn write_view_csv(path: &Path, scene: &SceneView) -> Result<usize> {
    ensure_parent_dirs(path)?;
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;

    write_view(file, scene).map_err(|e| WriteError::CsvError {
        path: path.display().to_string(),
        source: e,
    })
}

/// Write a scene view as CSV to any writer.
pub fn write_view<W: Write>(writer: W, scene: &SceneView) -> csv::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let header = VIEW_COLUMNS
        .iter()
        .copied()
        .chain(scene.passthrough_columns.iter().map(String::as_str));
    csv_writer.write_record(header)?;

    for view_star in &scene.stars {
        let star = &view_star.star;
        let numbers = [
            star.x,
            star.y,
            star.z,
            star.radius,
            view_star.visual_size,
            view_star.visual_opacity,
            star.l,
            star.b,
            star.parallax,
            star.distance_pc,
        ];

        let record = numbers
            .iter()
            .map(|v| v.to_string())
            .chain(star.extra.iter().cloned());
        csv_writer.write_record(record)?;
    }

    csv_writer.flush()?;
    Ok(scene.len())
}
