mod collection;
mod error;
mod row;
mod table;

pub use collection::TableCollection;
pub use error::ModelError;
pub use row::Row;
pub use table::{parse_table_input, parse_tags, RowFilter, TableRecord};
