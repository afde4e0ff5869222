//! Directory-backed storage.

use super::StateStorage;
use crate::error::PersistenceError;
use crate::formats::{Encoding, Packed};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Stores each state as `<dir>/<name>.<ext>`.
///
/// Loads fall back to the file of the other encoding when the configured one
/// is absent, so switching encodings keeps earlier state readable. Saves go through a temporary sibling file that is synced and then renamed
/// over the target, so a crash never leaves a half-written record behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    encoding: Encoding,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>, encoding: Encoding) -> Self {
        Self {
            dir: dir.into(),
            encoding,
        }
    }

    /// Path of the file a state name is stored in.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.path_with(name, self.encoding)
    }

    fn path_with(&self, name: &str, encoding: Encoding) -> PathBuf {
        self.dir.join(format!("{name}.{}", encoding.extension()))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_if_exists(path: &Path) -> Result<Option<Vec<u8>>, PersistenceError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_error(path, err)),
    }
}

impl StateStorage for FileStorage {
    fn load(&self, name: &str) -> Result<Option<Packed>, PersistenceError> {
        if let Some(bytes) = read_if_exists(&self.path_for(name))? {
            return self.encoding.decode(&bytes).map(Some);
        }

        let fallback = self.path_with(name, self.encoding.alternate());
        let Some(bytes) = read_if_exists(&fallback)? else {
            return Ok(None);
        };
        info!(
            state = name,
            path = %fallback.display(),
            "Loading shared age state written with another encoding"
        );
        Encoding::detect(&bytes).decode(&bytes).map(Some)
    }

    fn save(&self, name: &str, packed: &Packed) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(|err| io_error(&self.dir, err))?;

        let path = self.path_for(name);
        let tmp = path.with_extension(format!("{}.tmp", self.encoding.extension()));
        let bytes = self.encoding.encode(packed)?;

        {
            let mut file = fs::File::create(&tmp).map_err(|err| io_error(&tmp, err))?;
            file.write_all(&bytes).map_err(|err| io_error(&tmp, err))?;
            file.sync_all().map_err(|err| io_error(&tmp, err))?;
        }
        fs::rename(&tmp, &path).map_err(|err| io_error(&path, err))?;
        Ok(())
    }
}
