//! Server sync over HTTP.
//!
//! The protocol is deliberately thin: the server stores one JSON blob
//! holding every table, and clients either fetch it whole or replace it
//! whole. All merge logic lives in the Client Store.

mod client;
mod error;
mod remote;

pub use client::{check_server, HttpTablesClient, HEALTH_PATH, TABLES_PATH};
pub use error::SyncError;
pub use remote::RemoteTables;
