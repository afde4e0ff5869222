//! # Store Configuration
//!
//! Settings for where and how the shared state is persisted. Every field has
//! a default, so an empty JSON object is a valid configuration.
//!
//! ```json
//! {
//!   "state_name": "ages",
//!   "namespace": "genesis",
//!   "encoding": "binary",
//!   "backend": { "kind": "redb", "path": "world/ages.redb" }
//! }
//! ```

use crate::error::{ConfigError, PersistenceError};
use crate::formats::Encoding;
use crate::primitives::{DEFAULT_NAMESPACE, DEFAULT_STATE_NAME};
use crate::registry::AgeRegistry;
use crate::storage::{FileStorage, RedbStorage, StateStorage};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default directory for file-backed storage.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Where the packed state lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Backend {
    /// One file per state name inside `dir`.
    File { dir: PathBuf },
    /// A redb database file.
    Redb { path: PathBuf },
}

impl Default for Backend {
    fn default() -> Self {
        Self::File {
            dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name of the persisted record.
    pub state_name: String,
    /// Namespace of the root record.
    pub namespace: String,
    pub encoding: Encoding,
    pub backend: Backend,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            state_name: DEFAULT_STATE_NAME.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            encoding: Encoding::default(),
            backend: Backend::default(),
        }
    }
}

impl StoreConfig {
    /// Parse settings from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|err| ConfigError::InvalidStoreConfig(err.to_string()))
    }

    /// Read settings from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|err| {
            ConfigError::InvalidStoreConfig(format!("{}: {err}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Open the configured backend.
    pub fn open_storage(&self) -> Result<Box<dyn StateStorage>, PersistenceError> {
        match &self.backend {
            Backend::File { dir } => Ok(Box::new(FileStorage::new(dir.clone(), self.encoding))),
            Backend::Redb { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                Ok(Box::new(RedbStorage::open(path, self.encoding)?))
            }
        }
    }

    /// An empty registry whose root record uses the configured namespace.
    #[must_use]
    pub fn registry(&self) -> AgeRegistry {
        AgeRegistry::new(self.namespace.clone())
    }
}
