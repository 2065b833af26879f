//! Opt-in memoization of loaded catalogs.
//!
//! Loading is the only expensive step around the pipeline, and a front end
//! that re-renders on every interaction usually wants to read the catalog
//! once. The cache is an explicit value owned by the caller, keyed by
//! [`CatalogSource::identity`], with caller-controlled invalidation.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, info};

use super::loaders::{CatalogSource, Result, StarTable};

/// Memoizes loaded star tables per source identity.
#[derive(Debug, Default)]
pub struct CatalogCache {
    tables: HashMap<String, Arc<StarTable>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `source`, loading it on first use.
    ///
    /// Load failures are not cached; the next call retries the source.
    pub fn get_or_load<S: CatalogSource + ?Sized>(&mut self, source: &S) -> Result<Arc<StarTable>> {
        let key = source.identity();
        if let Some(table) = self.tables.get(&key) {
            debug!("Catalog cache hit: {}", key);
            return Ok(Arc::clone(table));
        }

        let table = Arc::new(source.load()?);
        info!("Catalog cached: {} ({} rows)", key, table.len());
        self.tables.insert(key, Arc::clone(&table));
        Ok(table)
    }

    /// Drops one entry. Returns true if it was cached.
    pub fn invalidate(&mut self, identity: &str) -> bool {
        self.tables.remove(identity).is_some()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.tables.contains_key(identity)
    }
}
