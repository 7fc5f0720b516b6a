//! dialogtab core library
//!
//! Table model, local durable storage, the HTTP sync client and the
//! Client Store that ties them together.

pub mod models;
pub mod storage;
pub mod store;
pub mod sync;

pub use models::{
    parse_table_input, parse_tags, ModelError, Row, RowFilter, TableCollection, TableRecord,
};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
pub use store::{
    ClientStore, PersistReport, RemoteStatus, StoreError, SyncReport, CURRENT_TABLE_KEY,
    TABLES_KEY,
};
pub use sync::{check_server, HttpTablesClient, RemoteTables, SyncError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
