mod config_cmd;
mod row;
mod sync_cmd;
mod table;

pub use config_cmd::ConfigCommand;
pub use row::RowCommand;
pub use sync_cmd::SyncCommand;
pub use table::TableCommand;

use clap::ValueEnum;

use crate::session::Store;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Picks the table a command works on: the explicit `--table`, else the
/// open table.
fn resolve_table(store: &Store, explicit: &Option<String>) -> Result<String, String> {
    if let Some(name) = explicit {
        if store.table(name).is_none() {
            return Err(format!("Table not found: {}", name));
        }
        return Ok(name.clone());
    }

    store.current_table().ok_or_else(|| {
        "No table is open. Use `dt table open <name>` or pass --table.".to_string()
    })
}

/// Converts a 1-based row number from the command line to an index.
fn row_index(number: usize) -> Result<usize, String> {
    number
        .checked_sub(1)
        .ok_or_else(|| "Row numbers start at 1".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_index() {
        assert_eq!(row_index(1), Ok(0));
        assert_eq!(row_index(12), Ok(11));
        assert!(row_index(0).is_err());
    }
}
