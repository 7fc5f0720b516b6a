//! Local durable key-value storage.
//!
//! The Client Store keeps its state under string keys, the same way a
//! browser keeps it in local storage. `FileStorage` is the on-disk
//! implementation; `MemoryStorage` keeps everything in process.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from local durable storage.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// String-keyed durable storage.
pub trait LocalStorage {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<T: LocalStorage + ?Sized> LocalStorage for &T {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}
