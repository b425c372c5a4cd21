use std::collections::HashMap;

use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::config::{DataSource, DataSourceFile};

const BUNDLED_TABLE: &str = include_str!("../../../config/data_sources.toml");

/// Configuration problems in the data-source table.
///
/// These are deploy-time mistakes, never data-quality issues, so they are
/// reported when the registry is built rather than repaired.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate data source id {0}")]
    DuplicateId(i64),

    #[error("data source id {0} must be positive")]
    InvalidId(i64),

    #[error("fallback data source {0} not found in trusted data sources")]
    UnknownFallback(i64),

    #[error("fallback data source {0} listed more than once")]
    DuplicateFallback(i64),

    #[error("fallback list is empty")]
    EmptyFallback,

    #[error("failed to read data source table at '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse data source table: {0}")]
    Parse(#[from] toml::de::Error),
}

impl From<RegistryError> for common::Error {
    fn from(e: RegistryError) -> Self {
        common::Error::Registry(e.to_string())
    }
}

/// Immutable catalog of trusted oracle feeds plus the curated fallback subset.
///
/// Built once at startup and shared read-only. Construction guarantees ids
/// are unique and positive, and that every fallback id resolves to an entry.
#[derive(Debug, Clone)]
pub struct DataSourceRegistry {
    sources: Vec<DataSource>,
    index: HashMap<i64, usize>,
    /// Positions in `sources`, in the order the fallback list gave them.
    fallback: Vec<usize>,
}

impl DataSourceRegistry {
    pub fn new(sources: Vec<DataSource>, fallback_ids: &[i64]) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(sources.len());
        for (pos, source) in sources.iter().enumerate() {
            if source.id <= 0 {
                return Err(RegistryError::InvalidId(source.id));
            }
            if index.insert(source.id, pos).is_some() {
                return Err(RegistryError::DuplicateId(source.id));
            }
        }

        if fallback_ids.is_empty() {
            return Err(RegistryError::EmptyFallback);
        }
        let mut fallback = Vec::with_capacity(fallback_ids.len());
        for id in fallback_ids {
            let pos = *index.get(id).ok_or(RegistryError::UnknownFallback(*id))?;
            if fallback.contains(&pos) {
                return Err(RegistryError::DuplicateFallback(*id));
            }
            fallback.push(pos);
        }

        Ok(Self {
            sources,
            index,
            fallback,
        })
    }

    pub fn from_file(file: DataSourceFile) -> Result<Self, RegistryError> {
        Self::new(file.sources, &file.fallback)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, RegistryError> {
        Self::from_file(DataSourceFile::from_toml_str(content)?)
    }

    /// Load and check a table from disk.
    pub fn load(path: &str) -> Result<Self, RegistryError> {
        let registry = Self::from_file(DataSourceFile::load(path)?)?;
        info!(
            path,
            sources = registry.len(),
            fallbacks = registry.fallback.len(),
            "Loaded data source registry"
        );
        Ok(registry)
    }

    /// The table shipped with the crate (`config/data_sources.toml`).
    pub fn bundled() -> Result<Self, RegistryError> {
        Self::from_toml_str(BUNDLED_TABLE)
    }

    pub fn get(&self, id: i64) -> Option<&DataSource> {
        self.index.get(&id).map(|&pos| &self.sources[pos])
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DataSource> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn fallbacks(&self) -> impl Iterator<Item = &DataSource> {
        self.fallback.iter().map(|&pos| &self.sources[pos])
    }

    /// Last known price for `id`, parsed. `None` if the id is unknown.
    pub fn price_of(&self, id: i64) -> Option<f64> {
        self.get(id).map(DataSource::price_value)
    }

    /// Uniform pick from the fallback subset. Never fails: `new` rejects
    /// an empty or inconsistent fallback list.
    pub(crate) fn pick_fallback<R: Rng + ?Sized>(&self, rng: &mut R) -> &DataSource {
        let pos = self.fallback[rng.gen_range(0..self.fallback.len())];
        &self.sources[pos]
    }
}
