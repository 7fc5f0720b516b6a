use std::fs;
use std::io;
use std::path::PathBuf;

use uuid::Uuid;

use super::{LocalStorage, StorageError};

/// Stores each key as `<data_dir>/<key>.json`.
///
/// Writes go to a temp file in the same directory which is then renamed
/// over the target, so a crash never leaves a half-written value behind.
#[derive(Debug, Clone)]
pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Returns the file that backs `key`.
    pub fn path(&self, key: &str) -> Result<PathBuf, StorageError> {
        Self::validate_key(key)?;
        Ok(self.data_dir.join(format!("{}.json", key)))
    }

    /// Keys become file names, so reject anything that could escape the
    /// data directory.
    fn validate_key(key: &str) -> Result<(), StorageError> {
        if key.is_empty()
            || key.contains('/')
            || key.contains('\\')
            || key.contains("..")
            || key.starts_with('.')
        {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(())
    }
}

impl LocalStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key)?;

        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;

        fs::create_dir_all(&self.data_dir).map_err(|e| StorageError::Io {
            path: self.data_dir.clone(),
            source: e,
        })?;

        let temp_path = self
            .data_dir
            .join(format!(".{}.{}.tmp", key, Uuid::new_v4().simple()));

        fs::write(&temp_path, value).map_err(|e| StorageError::Io {
            path: temp_path.clone(),
            source: e,
        })?;

        if let Err(e) = fs::rename(&temp_path, &path) {
            let _ = fs::remove_file(&temp_path);
            return Err(StorageError::Io { path, source: e });
        }

        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path(key)?;

        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io { path, source: e }),
        }
    }
}
