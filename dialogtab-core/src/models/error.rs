use thiserror::Error;

/// Errors from editing a table in memory.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Table name must not be empty")]
    EmptyTableName,

    #[error("Row {index} does not exist (table has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },
}
