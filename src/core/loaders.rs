//! Star catalog loading.
//!
//! The pipeline itself never touches the filesystem. This module is the input
//! collaborator: it turns a CSV export (Gaia style, with at least `l`, `b` and
//! `parallax` columns) into an in-memory [`StarTable`]. Columns the pipeline
//! does not use are carried through as raw strings.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use log::debug;
use thiserror::Error;

/// Galactic longitude column, degrees.
pub const COL_L: &str = "l";
/// Galactic latitude column, degrees.
pub const COL_B: &str = "b";
/// Parallax column, milliarcseconds.
pub const COL_PARALLAX: &str = "parallax";

/// Columns every catalog must carry in its schema.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_L, COL_B, COL_PARALLAX];

/// Errors raised by the catalog source.
#[derive(Error, Debug)]
pub enum DataSourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog not found: {0}")]
    NotFound(PathBuf),

    #[error("Empty file (no header row): {0}")]
    EmptyFile(String),
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, DataSourceError>;

/// One raw catalog row.
///
/// Required fields are `None` when the cell is blank, `NaN` or not a number.
#[derive(Debug, Clone, PartialEq)]
pub struct StarRow {
    /// Galactic longitude in degrees.
    pub l: Option<f64>,
    /// Galactic latitude in degrees.
    pub b: Option<f64>,
    /// Parallax in milliarcseconds.
    pub parallax: Option<f64>,
    /// Pass-through cells, aligned with [`StarTable::passthrough_columns`].
    pub extra: Vec<String>,
}

impl StarRow {
    /// Creates a row without pass-through cells.
    pub fn new(l: Option<f64>, b: Option<f64>, parallax: Option<f64>) -> Self {
        Self {
            l,
            b,
            parallax,
            extra: Vec::new(),
        }
    }

    /// Creates a row with every required field present.
    pub fn complete(l: f64, b: f64, parallax: f64) -> Self {
        Self::new(Some(l), Some(b), Some(parallax))
    }

    /// Attaches pass-through cells.
    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }
}

/// A star catalog as read from the source: the column schema plus rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StarTable {
    /// Column names in source order, including required ones.
    pub columns: Vec<String>,
    /// Catalog rows.
    pub rows: Vec<StarRow>,
}

impl StarTable {
    /// Creates an empty table with the given schema.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Creates a table with the standard `l, b, parallax` schema.
    pub fn with_required_columns() -> Self {
        Self::new(REQUIRED_COLUMNS)
    }

    /// Creates a table from a schema and rows.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<StarRow>,
    ) -> Self {
        let mut table = Self::new(columns);
        table.rows = rows;
        table
    }

    /// Returns the number of rows.
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Adds a row.
    #[inline]
    pub fn push(&mut self, row: StarRow) {
        self.rows.push(row);
    }

    /// Case-insensitive schema lookup.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns
            .iter()
            .any(|c| normalize_header(c) == normalize_header(name))
    }

    /// Names of the required columns absent from the schema, in
    /// [`REQUIRED_COLUMNS`] order.
    pub fn missing_required_columns(&self) -> Vec<&'static str> {
        REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| !self.has_column(name))
            .collect()
    }

    /// Columns carried through untouched, in source order.
    pub fn passthrough_columns(&self) -> Vec<&str> {
        let mut seen_required = [false; 3];
        let mut out = Vec::new();
        for column in &self.columns {
            match required_slot(column) {
                Some(slot) if !seen_required[slot] => seen_required[slot] = true,
                _ => out.push(column.as_str()),
            }
        }
        out
    }

    /// Same schema, no rows.
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
        }
    }
}

/// Something that can produce a star table: a file, a URL, a test fixture.
///
/// `identity` must be stable for the same underlying data; it is the key the
/// [`CatalogCache`](super::cache::CatalogCache) memoizes on.
pub trait CatalogSource {
    /// Stable key for this source.
    fn identity(&self) -> String;

    /// Reads the full table.
    fn load(&self) -> Result<StarTable>;
}

/// A CSV catalog on disk.
#[derive(Debug, Clone)]
pub struct CsvCatalog {
    path: PathBuf,
}

impl CsvCatalog {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for CsvCatalog {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn load(&self) -> Result<StarTable> {
        load_catalog_csv(&self.path)
    }
}

/// Load a star catalog from a CSV file.
///
/// # Errors
///
/// Returns [`DataSourceError::NotFound`] if the file does not exist, and an
/// I/O or CSV error if it cannot be read. A header without rows is a valid,
/// empty table.
pub fn load_catalog_csv<P: AsRef<Path>>(path: P) -> Result<StarTable> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DataSourceError::NotFound(path.to_path_buf()));
    }

    let file = File::open(path)?;
    let table = read_catalog(BufReader::new(file), &path.display().to_string())?;

    debug!(
        "Loaded {} rows ({} columns) from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );

    Ok(table)
}

/// Parse a star catalog from any CSV reader.
///
/// `origin` is only used in error messages.
pub fn read_catalog<R: Read>(reader: R, origin: &str) -> Result<StarTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() || (headers.len() == 1 && headers.get(0) == Some("")) {
        return Err(DataSourceError::EmptyFile(origin.to_string()));
    }

    // First occurrence of each required column wins; everything else passes through
    let mut required_idx: HashMap<usize, usize> = HashMap::new();
    let mut passthrough_idx = Vec::new();
    for (i, name) in headers.iter().enumerate() {
        match required_slot(name) {
            Some(slot) if !required_idx.contains_key(&slot) => {
                required_idx.insert(slot, i);
            }
            _ => passthrough_idx.push(i),
        }
    }

    let mut table = StarTable::new(headers.iter());
    let field = |record: &csv::StringRecord, slot: usize| {
        required_idx
            .get(&slot)
            .and_then(|&i| record.get(i))
            .and_then(parse_cell)
    };

    for result in reader.records() {
        let record = result?;

        let extra = passthrough_idx
            .iter()
            .map(|&i| record.get(i).unwrap_or_default().to_string())
            .collect();

        table.push(StarRow {
            l: field(&record, 0),
            b: field(&record, 1),
            parallax: field(&record, 2),
            extra,
        });
    }

    Ok(table)
}

fn normalize_header(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Index into [`REQUIRED_COLUMNS`] for a header name, if it is one.
fn required_slot(name: &str) -> Option<usize> {
    let name = normalize_header(name);
    REQUIRED_COLUMNS.iter().position(|&c| c == name)
}

/// Blank, NaN and unparsable cells all count as missing.
fn parse_cell(cell: &str) -> Option<f64> {
    let value: f64 = cell.trim().parse().ok()?;
    if value.is_nan() {
        None
    } else {
        Some(value)
    }
}
