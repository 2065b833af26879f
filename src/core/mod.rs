//! Core data types and I/O operations.

pub mod cache;
pub mod loaders;
pub mod transforms;
pub mod writers;

pub use cache::CatalogCache;
pub use loaders::{load_catalog_csv, CatalogSource, CsvCatalog, DataSourceError, StarRow, StarTable};
pub use transforms::{clean, distance_pc, locate, to_cartesian, CleanStats, PlacedStar, TransformError};
pub use writers::{write_view_csv, WriteError};
