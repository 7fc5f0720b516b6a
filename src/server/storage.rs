//! Server-side storage for the table collection.
//!
//! The whole collection lives in one pretty-printed JSON file:
//! ```text
//! <data_file>          e.g. ~/.local/share/dialogtab-server/tables.json
//! ```
//!
//! The server never looks inside the tables; it stores whatever JSON
//! object the client sent.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The stored blob: table name -> table record, kept as raw JSON.
pub type Tables = Map<String, Value>;

/// Errors that can occur during server storage operations.
#[derive(Debug)]
pub enum ServerStorageError {
    /// I/O error reading or writing a file.
    IoError(PathBuf, io::Error),
    /// The collection could not be serialized.
    SerializeError(String),
}

impl std::fmt::Display for ServerStorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerStorageError::IoError(path, e) => {
                write!(f, "I/O error for {}: {}", path.display(), e)
            }
            ServerStorageError::SerializeError(e) => {
                write!(f, "Failed to serialize tables: {}", e)
            }
        }
    }
}

impl std::error::Error for ServerStorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerStorageError::IoError(_, e) => Some(e),
            ServerStorageError::SerializeError(_) => None,
        }
    }
}

/// Get-all / put-all storage for the table collection.
///
/// Implementations replace the whole blob on every save; there is no
/// merging and no locking, so the last writer wins.
pub trait TableStore: Send + Sync {
    /// Returns the stored collection, or an empty one if nothing has been
    /// saved yet.
    fn load(&self) -> Result<Tables, ServerStorageError>;

    /// Replaces the stored collection.
    fn save(&self, tables: &Tables) -> Result<(), ServerStorageError>;
}

/// Keeps the collection in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileTableStore {
    path: PathBuf,
}

impl FileTableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Unique temp file next to the data file, so concurrent saves never
    /// share one.
    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "tables.json".to_string());
        self.path
            .with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

impl TableStore for FileTableStore {
    fn load(&self) -> Result<Tables, ServerStorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Tables::new()),
            Err(e) => return Err(ServerStorageError::IoError(self.path.clone(), e)),
        };

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(tables)) => Ok(tables),
            Ok(_) => {
                tracing::warn!(
                    "Data file {} does not hold an object, serving empty tables",
                    self.path.display()
                );
                Ok(Tables::new())
            }
            Err(e) => {
                tracing::warn!(
                    "Data file {} is not valid JSON, serving empty tables: {}",
                    self.path.display(),
                    e
                );
                Ok(Tables::new())
            }
        }
    }

    fn save(&self, tables: &Tables) -> Result<(), ServerStorageError> {
        // Create data directory if needed
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| ServerStorageError::IoError(dir.to_path_buf(), e))?;
        }

        let json = serde_json::to_string_pretty(tables)
            .map_err(|e| ServerStorageError::SerializeError(e.to_string()))?;

        // Write atomically using temp file + rename
        let temp_path = self.temp_path();
        fs::write(&temp_path, json)
            .map_err(|e| ServerStorageError::IoError(temp_path.clone(), e))?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(ServerStorageError::IoError(self.path.clone(), e));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (FileTableStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileTableStore::new(temp_dir.path().join("data").join("tables.json"));
        (store, temp_dir)
    }

    fn tables(value: Value) -> Tables {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (store, _temp) = setup();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_creates_directory() {
        let (store, temp) = setup();
        store.save(&Tables::new()).unwrap();
        assert!(temp.path().join("data").join("tables.json").exists());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (store, _temp) = setup();
        let saved = tables(json!({
            "Hero": {"rows": [{"dialogue": "Hello", "story": "Intro", "isFavorite": false}], "tags": ["protagonist"]}
        }));

        store.save(&saved).unwrap();

        assert_eq!(store.load().unwrap(), saved);
    }

    #[test]
    fn test_save_is_pretty_printed() {
        let (store, _temp) = setup();
        store.save(&tables(json!({"A": {"rows": [], "tags": []}}))).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("\n  \"A\": {"));
    }

    #[test]
    fn test_save_overwrites_without_merging() {
        let (store, _temp) = setup();
        store.save(&tables(json!({"A": {}, "B": {}}))).unwrap();
        store.save(&tables(json!({"C": {}}))).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key("C"));
    }

    #[test]
    fn test_save_leaves_no_temp_files() {
        let (store, temp) = setup();
        store.save(&tables(json!({"A": {}}))).unwrap();
        store.save(&tables(json!({"B": {}}))).unwrap();

        let entries: Vec<_> = fs::read_dir(temp.path().join("data")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let (store, _temp) = setup();
        fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        fs::write(store.path(), "{ nope").unwrap();
        assert!(store.load().unwrap().is_empty());

        fs::write(store.path(), "[1, 2]").unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_path_is_error() {
        let temp_dir = TempDir::new().unwrap();
        // a directory where the file should be
        let store = FileTableStore::new(temp_dir.path());
        assert!(matches!(
            store.load(),
            Err(ServerStorageError::IoError(_, _))
        ));
    }

    #[test]
    fn test_unwritable_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "file, not dir").unwrap();
        let store = FileTableStore::new(blocker.join("tables.json"));

        assert!(matches!(
            store.save(&Tables::new()),
            Err(ServerStorageError::IoError(_, _))
        ));
    }
}
