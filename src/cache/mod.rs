//! Framework cache
//!
//! Resolving the platform resources is expensive, so the resolved stores and
//! the interpolator index are written once and loaded by every application
//! run. Keys are namespaced with the framework package on save, so loaded
//! entries never collide with an application's own resources.

use crate::resources::{AttributeStore, InterpolatorIndex, ValueStore, FRAMEWORK_PACKAGE};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Framework cache file {} not found, resolve the framework first", .0.display())]
    Missing(PathBuf),
    #[error("Failed to read cache file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse cache: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Cache version mismatch in {}: found {found}, expected {expected}", .path.display())]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    #[error("Cache file {} belongs to scope {found}", .path.display())]
    ScopeMismatch { path: PathBuf, found: String },
}

/// Current cache format version
pub const CACHE_VERSION: u32 = 1;

const VALUE_FILE: &str = "valueResources.json";
const ATTRIBUTE_FILE: &str = "attributeResources.json";
const INTERPOLATOR_FILE: &str = "frameworkInterpolators.json";

/// On-disk envelope of one cache file
#[derive(Debug, Serialize, Deserialize)]
struct CacheFile<T> {
    version: u32,
    scope: String,
    data: T,
}

/// Everything an application run needs from the framework
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameworkSnapshot {
    pub values: ValueStore,
    pub attributes: AttributeStore,
    pub interpolators: InterpolatorIndex,
}

/// The three cache files in one directory
#[derive(Debug, Clone)]
pub struct FrameworkCache {
    dir: PathBuf,
}

impl FrameworkCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Whether all cache files are present
    pub fn exists(&self) -> bool {
        self.paths().iter().all(|p| p.is_file())
    }

    fn paths(&self) -> [PathBuf; 3] {
        [
            self.dir.join(VALUE_FILE),
            self.dir.join(ATTRIBUTE_FILE),
            self.dir.join(INTERPOLATOR_FILE),
        ]
    }

    /// Persist a framework-scope snapshot, namespacing every key
    pub fn save(&self, snapshot: &FrameworkSnapshot) -> Result<(), CacheError> {
        fs::create_dir_all(&self.dir)?;
        let [values, attributes, interpolators] = self.paths();

        write_file(&values, snapshot.values.namespaced())?;
        write_file(&attributes, snapshot.attributes.namespaced())?;
        write_file(&interpolators, snapshot.interpolators.namespaced())?;

        info!(
            "Cached {} values, {} attributes and {} interpolators in {}",
            snapshot.values.len(),
            snapshot.attributes.len(),
            snapshot.interpolators.len(),
            self.dir.display()
        );
        Ok(())
    }

    /// Load the namespaced snapshot
    pub fn load(&self) -> Result<FrameworkSnapshot, CacheError> {
        let [values, attributes, interpolators] = self.paths();

        let snapshot = FrameworkSnapshot {
            values: read_file(&values)?,
            attributes: read_file(&attributes)?,
            interpolators: read_file(&interpolators)?,
        };

        debug!(
            "Loaded {} framework values, {} attributes, {} interpolators",
            snapshot.values.len(),
            snapshot.attributes.len(),
            snapshot.interpolators.len()
        );
        Ok(snapshot)
    }
}

fn write_file<T: Serialize>(path: &Path, data: T) -> Result<(), CacheError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    let envelope = CacheFile {
        version: CACHE_VERSION,
        scope: FRAMEWORK_PACKAGE.to_string(),
        data,
    };
    serde_json::to_writer(&mut writer, &envelope)?;
    writer.flush()?;
    Ok(())
}

fn read_file<T: DeserializeOwned>(path: &Path) -> Result<T, CacheError> {
    if !path.is_file() {
        return Err(CacheError::Missing(path.to_path_buf()));
    }

    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let envelope: CacheFile<T> = serde_json::from_reader(reader)?;

    if envelope.version != CACHE_VERSION {
        return Err(CacheError::VersionMismatch {
            path: path.to_path_buf(),
            found: envelope.version,
            expected: CACHE_VERSION,
        });
    }
    if envelope.scope != FRAMEWORK_PACKAGE {
        return Err(CacheError::ScopeMismatch {
            path: path.to_path_buf(),
            found: envelope.scope,
        });
    }

    Ok(envelope.data)
}
