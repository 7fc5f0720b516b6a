//! Sync error types.

use thiserror::Error;

/// Errors from talking to the persistence server.
///
/// None of these are fatal to the Client Store: local state stays
/// authoritative and the failure is reported to the caller.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The request never got an HTTP response (DNS, refused, reset...).
    #[error("Server unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-2xx status.
    #[error("Server returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The response body was not a table collection.
    #[error("Invalid response from server: {0}")]
    Decode(String),
}
