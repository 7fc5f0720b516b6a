//! The Client Store: the authoritative in-memory table collection for a
//! session, plus the rules for keeping it in step with local storage and
//! the server.
//!
//! Local writes are always applied first and always kept. Remote calls are
//! best effort: their failures come back as report values, never as
//! errors, so a flaky server can never discard a local edit.

use thiserror::Error;

use crate::models::{parse_table_input, ModelError, TableCollection, TableRecord};
use crate::storage::{LocalStorage, StorageError};
use crate::sync::{RemoteTables, SyncError};

/// Local storage key holding the serialized collection.
pub const TABLES_KEY: &str = "dialogue_tables";
/// Local storage key holding the name of the open table.
pub const CURRENT_TABLE_KEY: &str = "current_table";

/// Errors from Client Store operations.
///
/// Remote failures are not here; see `RemoteStatus` and `SyncReport`.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Local storage error: {0}")]
    Local(#[from] StorageError),

    #[error("Failed to serialize tables: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("A table named '{0}' already exists")]
    TableExists(String),

    #[error("Table not found: {0}")]
    TableNotFound(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// What happened to the remote half of a persist.
#[derive(Debug)]
pub enum RemoteStatus {
    /// The server accepted the collection.
    Synced,
    /// No server is configured.
    Skipped,
    /// The push failed; the local copy is still saved.
    Failed(SyncError),
}

/// Result of `ClientStore::persist`.
#[derive(Debug)]
pub struct PersistReport {
    /// Blank rows dropped before writing.
    pub pruned_rows: usize,
    pub remote: RemoteStatus,
}

impl PersistReport {
    pub fn remote_error(&self) -> Option<&SyncError> {
        match &self.remote {
            RemoteStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of `ClientStore::sync_from_server`.
#[derive(Debug)]
pub enum SyncReport {
    /// These local tables were replaced by the server's copy.
    Updated(Vec<String>),
    /// Nothing on the server differed from local tables.
    Unchanged,
    /// No server is configured.
    Skipped,
    /// The fetch failed; local state is untouched.
    Failed(SyncError),
}

/// Holds every table for one session.
///
/// `L` is the local durable storage and `R` the server. A store without a
/// remote persists locally only.
pub struct ClientStore<L, R> {
    local: L,
    remote: Option<R>,
    tables: TableCollection,
}

impl<L: LocalStorage, R: RemoteTables> ClientStore<L, R> {
    /// Creates a store and loads whatever is in local storage.
    pub fn open(local: L, remote: Option<R>) -> Self {
        let tables = load_tables(&local);
        Self {
            local,
            remote,
            tables,
        }
    }

    /// Re-reads the collection from local storage, discarding unsaved
    /// in-memory changes.
    ///
    /// Never fails: missing or malformed data reads as an empty collection.
    pub fn load(&mut self) -> &TableCollection {
        self.tables = load_tables(&self.local);
        &self.tables
    }

    pub fn tables(&self) -> &TableCollection {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&TableRecord> {
        self.tables.get(name)
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Inserts or overwrites a table. Blank rows are accepted here and
    /// dropped on the next persist.
    pub fn replace_table(
        &mut self,
        name: impl Into<String>,
        record: TableRecord,
    ) -> Option<TableRecord> {
        self.tables.insert(name, record)
    }

    /// Creates an empty table from `name, tag, tag` input and returns the
    /// parsed name. Existing tables are never overwritten.
    pub fn create_table(&mut self, input: &str) -> Result<String, StoreError> {
        let (name, tags) = parse_table_input(input)?;
        if self.tables.contains(&name) {
            return Err(StoreError::TableExists(name));
        }
        self.tables
            .insert(name.clone(), TableRecord::new().with_tags(tags));
        Ok(name)
    }

    /// Applies an edit to one table in place.
    pub fn update_table<T, F>(&mut self, name: &str, edit: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut TableRecord) -> Result<T, ModelError>,
    {
        let record = self
            .tables
            .get_mut(name)
            .ok_or_else(|| StoreError::TableNotFound(name.to_string()))?;
        Ok(edit(record)?)
    }

    /// Removes each named table and returns the names that were present.
    /// Unknown names are ignored.
    pub fn delete_tables<I, S>(&mut self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let current = self.stored_current_table();
        let mut removed = Vec::new();

        for name in names {
            let name = name.as_ref();
            if self.tables.remove(name).is_some() {
                removed.push(name.to_string());
            }
        }

        if let Some(current) = current {
            if removed.contains(&current) {
                if let Err(e) = self.local.remove_item(CURRENT_TABLE_KEY) {
                    tracing::warn!("Failed to clear current table: {}", e);
                }
            }
        }

        removed
    }

    /// Writes the collection to local storage, then pushes it to the
    /// server.
    ///
    /// Only a local storage failure is an error. A failed push is reported
    /// in the returned `PersistReport` and the local write stands.
    pub async fn persist(&mut self) -> Result<PersistReport, StoreError> {
        let pruned_rows = self.tables.prune_blank_rows();
        self.write_local()?;

        let remote = match &self.remote {
            None => RemoteStatus::Skipped,
            Some(remote) => match remote.push_tables(&self.tables).await {
                Ok(()) => RemoteStatus::Synced,
                Err(e) => {
                    tracing::warn!("Saved locally but server push failed: {}", e);
                    RemoteStatus::Failed(e)
                }
            },
        };

        Ok(PersistReport {
            pruned_rows,
            remote,
        })
    }

    /// Pulls the server collection once and overlays it onto local tables.
    ///
    /// Only tables that already exist locally are considered, and each is
    /// replaced only if its serialized content differs from the server's.
    /// Server-only tables are never pulled in, so a table deleted locally
    /// is not resurrected. Local storage is rewritten only if something
    /// changed.
    pub async fn sync_from_server(&mut self) -> Result<SyncReport, StoreError> {
        let Some(remote) = &self.remote else {
            return Ok(SyncReport::Skipped);
        };

        let server_tables = match remote.fetch_tables().await {
            Ok(tables) => tables,
            Err(e) => {
                tracing::warn!("Failed to sync from server: {}", e);
                return Ok(SyncReport::Failed(e));
            }
        };

        let mut updated = Vec::new();
        for (name, server_record) in server_tables {
            let differs = match self.tables.get(&name) {
                None => {
                    tracing::debug!("Ignoring server-only table '{}'", name);
                    continue;
                }
                Some(local_record) => !same_content(local_record, &server_record),
            };

            if differs {
                tracing::debug!("Server copy of '{}' replaces local copy", name);
                self.tables.insert(name.clone(), server_record);
                updated.push(name);
            }
        }

        if updated.is_empty() {
            return Ok(SyncReport::Unchanged);
        }

        self.write_local()?;
        tracing::info!("Updated {} table(s) from server", updated.len());
        Ok(SyncReport::Updated(updated))
    }

    /// The open table, if one is remembered and still exists.
    pub fn current_table(&self) -> Option<String> {
        self.stored_current_table()
            .filter(|name| self.tables.contains(name))
    }

    /// Remembers `name` as the open table.
    pub fn open_table(&self, name: &str) -> Result<(), StoreError> {
        if !self.tables.contains(name) {
            return Err(StoreError::TableNotFound(name.to_string()));
        }
        self.local.set_item(CURRENT_TABLE_KEY, name)?;
        Ok(())
    }

    /// Forgets the open table.
    pub fn close_table(&self) -> Result<(), StoreError> {
        self.local.remove_item(CURRENT_TABLE_KEY)?;
        Ok(())
    }

    fn stored_current_table(&self) -> Option<String> {
        match self.local.get_item(CURRENT_TABLE_KEY) {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!("Failed to read current table: {}", e);
                None
            }
        }
    }

    fn write_local(&self) -> Result<(), StoreError> {
        let data = serde_json::to_string(&self.tables)?;
        self.local.set_item(TABLES_KEY, &data)?;
        Ok(())
    }
}

/// Reads the collection from local storage, upgrading legacy records.
/// Anything unreadable degrades to an empty collection.
fn load_tables<L: LocalStorage>(local: &L) -> TableCollection {
    let data = match local.get_item(TABLES_KEY) {
        Ok(Some(data)) => data,
        Ok(None) => return TableCollection::new(),
        Err(e) => {
            tracing::warn!("Failed to read local tables, starting empty: {}", e);
            return TableCollection::new();
        }
    };

    match serde_json::from_str(&data) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::warn!("Local tables are malformed, starting empty: {}", e);
            TableCollection::new()
        }
    }
}

/// Compares two records by their serialized form.
fn same_content(a: &TableRecord, b: &TableRecord) -> bool {
    match (serde_json::to_vec(a), serde_json::to_vec(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
