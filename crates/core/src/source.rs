use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use featurelens_index::{detail_path, FeatureDetail, FeatureSummary, HAS_DATA_FILE, INDEX_FILE};

use crate::error::{FeatureError, Result};

/// Environment variable overriding the default artifact directory.
pub const DATA_DIR_ENV: &str = "FEATURELENS_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "data";

/// Capability interface over the three on-disk artifacts. `Ok(None)` means
/// the artifact does not exist; `Err` means it exists but could not be read
/// or parsed.
pub trait ArtifactSource {
    fn read_index(&self) -> Result<Option<Vec<FeatureSummary>>>;
    fn read_has_data_ids(&self) -> Result<Option<Vec<u32>>>;
    fn read_detail(&self, id: u32) -> Result<Option<FeatureDetail>>;
}

/// Production source backed by a data directory of JSON artifacts.
#[derive(Debug, Clone)]
pub struct FsArtifactSource {
    root: PathBuf,
}

impl FsArtifactSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Resolves the data directory from `FEATURELENS_DATA_DIR`, falling back
    /// to `./data`.
    pub fn from_env() -> Self {
        let root = std::env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_json_opt<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let value = serde_json::from_slice(&bytes)
            .map_err(|err| FeatureError::malformed(path, err))?;
        Ok(Some(value))
    }
}

impl ArtifactSource for FsArtifactSource {
    fn read_index(&self) -> Result<Option<Vec<FeatureSummary>>> {
        self.read_json_opt(&self.root.join(INDEX_FILE))
    }

    fn read_has_data_ids(&self) -> Result<Option<Vec<u32>>> {
        self.read_json_opt(&self.root.join(HAS_DATA_FILE))
    }

    fn read_detail(&self, id: u32) -> Result<Option<FeatureDetail>> {
        self.read_json_opt(&detail_path(&self.root, id))
    }
}

/// In-memory source for tests and embedded fixtures.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pub index: Option<Vec<FeatureSummary>>,
    pub has_data_ids: Option<Vec<u32>>,
    pub details: HashMap<u32, FeatureDetail>,
}

impl MemorySource {
    pub fn with_index(index: Vec<FeatureSummary>) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

impl ArtifactSource for MemorySource {
    fn read_index(&self) -> Result<Option<Vec<FeatureSummary>>> {
        Ok(self.index.clone())
    }

    fn read_has_data_ids(&self) -> Result<Option<Vec<u32>>> {
        Ok(self.has_data_ids.clone())
    }

    fn read_detail(&self, id: u32) -> Result<Option<FeatureDetail>> {
        Ok(self.details.get(&id).cloned())
    }
}
