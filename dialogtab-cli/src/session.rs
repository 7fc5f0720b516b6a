//! Opens the Client Store for one CLI invocation.
//!
//! Like the browser app on page load, the session pulls from the server
//! once before running the command. Every mutating command then saves
//! through `save`, which writes locally first and pushes second.

use dialogtab_core::{
    ClientStore, FileStorage, HttpTablesClient, PersistReport, RemoteStatus, StoreError,
    SyncReport,
};

use crate::config::Config;

/// The store type used by every command.
pub type Store = ClientStore<FileStorage, HttpTablesClient>;

/// Opens the store from config.
///
/// With `offline` set, or no server configured, the store has no remote.
/// When `pull` is set and a server is available, a pull runs before
/// returning. A failed pull only prints a warning.
pub async fn open_store(config: &Config, offline: bool, pull: bool) -> Result<Store, StoreError> {
    let local = FileStorage::new(config.data_dir.value.clone());
    let remote = if offline {
        None
    } else {
        config.sync.server_url.clone().map(HttpTablesClient::new)
    };

    let mut store = ClientStore::open(local, remote);

    if pull && config.sync.pull_on_start && store.has_remote() {
        match store.sync_from_server().await? {
            SyncReport::Updated(names) => {
                tracing::info!("Pulled {} from server", names.join(", "));
            }
            SyncReport::Failed(e) => {
                eprintln!("Warning: could not sync from server: {}", e);
            }
            SyncReport::Unchanged | SyncReport::Skipped => {}
        }
    }

    Ok(store)
}

/// Persists the store and reports what happened to the remote push.
pub async fn save(store: &mut Store) -> Result<PersistReport, StoreError> {
    let report = store.persist().await?;

    if report.pruned_rows > 0 {
        println!(
            "Dropped {} empty row{}.",
            report.pruned_rows,
            if report.pruned_rows == 1 { "" } else { "s" }
        );
    }

    if let RemoteStatus::Failed(e) = &report.remote {
        eprintln!(
            "Warning: saved locally, but the server did not accept the change ({}). \
             Other devices will not see it until the next successful save.",
            e
        );
    }

    Ok(report)
}
