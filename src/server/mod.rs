//! Server-side modules for the dialogtab sync server.

pub mod api;
pub mod storage;

pub use api::{router, ApiError, AppState};
pub use storage::{FileTableStore, ServerStorageError, TableStore, Tables};
