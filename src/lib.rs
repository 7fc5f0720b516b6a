//! dialogtab sync server
//!
//! A pass-through store for one JSON blob holding every dialogue table.
//! Clients fetch it whole and replace it whole; the server never merges.

pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig};
pub use server::{router, AppState, FileTableStore, ServerStorageError, TableStore};
