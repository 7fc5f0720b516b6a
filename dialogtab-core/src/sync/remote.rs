use crate::models::TableCollection;

use super::SyncError;

/// The server side of the sync contract: fetch or replace the whole
/// collection. There is no per-table addressing.
#[allow(async_fn_in_trait)]
pub trait RemoteTables {
    async fn fetch_tables(&self) -> Result<TableCollection, SyncError>;

    async fn push_tables(&self, tables: &TableCollection) -> Result<(), SyncError>;
}

impl<T: RemoteTables> RemoteTables for &T {
    async fn fetch_tables(&self) -> Result<TableCollection, SyncError> {
        (**self).fetch_tables().await
    }

    async fn push_tables(&self, tables: &TableCollection) -> Result<(), SyncError> {
        (**self).push_tables(tables).await
    }
}
