use clap::{Args, Subcommand};
use serde::Serialize;

use dialogtab_core::{parse_tags, Row, RowFilter, TableRecord};

use super::{resolve_table, OutputFormat};
use crate::session::{self, Store};

#[derive(Args)]
pub struct TableCommand {
    #[command(subcommand)]
    pub command: TableSubcommand,
}

#[derive(Subcommand)]
pub enum TableSubcommand {
    /// List tables
    List {
        /// Only show tables with this tag (repeat to match any of several)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a table and open it
    ///
    /// Tags may follow the name, separated by commas: "Hero, protagonist, lead"
    Create {
        /// Table name, optionally followed by comma separated tags
        input: String,
    },

    /// Open a table so row commands work on it
    Open { name: String },

    /// Close the open table
    Close,

    /// Show the rows of a table
    Show {
        /// Table name (defaults to the open table)
        name: Option<String>,

        /// Only rows whose dialogue or story contains this text
        #[arg(long, short)]
        search: Option<String>,

        /// Only favorite rows
        #[arg(long)]
        favorites: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace the tags of a table
    Tags {
        /// Comma separated tags; an empty string clears them
        tags: String,

        /// Table name (defaults to the open table)
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Delete one or more tables
    Delete {
        #[arg(required = true)]
        names: Vec<String>,
    },
}

#[derive(Serialize)]
struct TableSummary<'a> {
    name: &'a str,
    tags: &'a [String],
    rows: usize,
}

#[derive(Serialize)]
struct NumberedRow<'a> {
    number: usize,
    #[serde(flatten)]
    row: &'a Row,
}

impl TableCommand {
    pub async fn run(&self, store: &mut Store) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TableSubcommand::List { tags, format } => self.list(store, tags, format),
            TableSubcommand::Create { input } => self.create(store, input).await,
            TableSubcommand::Open { name } => {
                store.open_table(name)?;
                println!("Opened '{}'.", name);
                Ok(())
            }
            TableSubcommand::Close => {
                store.close_table()?;
                println!("Closed table.");
                Ok(())
            }
            TableSubcommand::Show {
                name,
                search,
                favorites,
                format,
            } => {
                let name = resolve_table(store, name)?;
                let filter = RowFilter {
                    search: search.clone(),
                    favorites_only: *favorites,
                };
                self.show(store, &name, &filter, format)
            }
            TableSubcommand::Tags { tags, table } => {
                let name = resolve_table(store, table)?;
                let tags = parse_tags(tags);
                store.update_table(&name, |record| {
                    record.set_tags(tags);
                    Ok(())
                })?;
                session::save(store).await?;
                let tags = store
                    .table(&name)
                    .map(|record| record.tags.clone())
                    .unwrap_or_default();
                print_tags(&name, &tags);
                Ok(())
            }
            TableSubcommand::Delete { names } => {
                let removed = store.delete_tables(names);
                for name in names.iter().filter(|n| !removed.contains(*n)) {
                    println!("Skipped '{}' (no such table).", name);
                }
                if removed.is_empty() {
                    return Ok(());
                }
                session::save(store).await?;
                println!(
                    "Deleted {} table{}: {}",
                    removed.len(),
                    if removed.len() == 1 { "" } else { "s" },
                    removed.join(", ")
                );
                Ok(())
            }
        }
    }

    fn list(
        &self,
        store: &Store,
        tags: &[String],
        format: &OutputFormat,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let tables = store.tables();
        let summaries: Vec<TableSummary> = tables
            .names_with_any_tag(tags)
            .into_iter()
            .filter_map(|name| {
                tables.get(name).map(|record| TableSummary {
                    name,
                    tags: &record.tags,
                    rows: record.rows.len(),
                })
            })
            .collect();

        match format {
            OutputFormat::Json => {
                let all_tags: Vec<&str> = tables.all_tags().into_iter().collect();
                let output = serde_json::json!({
                    "tables": summaries,
                    "tags": all_tags,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => {
                if tables.is_empty() {
                    println!("No tables yet. Create one with `dt table create <name>`.");
                    return Ok(());
                }

                let current = store.current_table();
                for summary in &summaries {
                    let marker = if current.as_deref() == Some(summary.name) {
                        "*"
                    } else {
                        " "
                    };
                    print!("{} {} ({} rows)", marker, summary.name, summary.rows);
                    if !summary.tags.is_empty() {
                        print!("  [{}]", summary.tags.join(", "));
                    }
                    println!();
                }
                if summaries.is_empty() {
                    println!("No tables match the selected tags.");
                }

                let all_tags = tables.all_tags();
                if !all_tags.is_empty() {
                    println!();
                    println!(
                        "Tags: {}",
                        all_tags.into_iter().collect::<Vec<_>>().join(", ")
                    );
                }
            }
        }

        Ok(())
    }

    async fn create(
        &self,
        store: &mut Store,
        input: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let name = store.create_table(input)?;
        session::save(store).await?;
        store.open_table(&name)?;

        println!("Created table '{}'.", name);
        if let Some(record) = store.table(&name) {
            if !record.tags.is_empty() {
                print_tags(&name, &record.tags);
            }
        }
        Ok(())
    }

    fn show(
        &self,
        store: &Store,
        name: &str,
        filter: &RowFilter,
        format: &OutputFormat,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let record = store
            .table(name)
            .ok_or_else(|| format!("Table not found: {}", name))?;
        let rows = record.filter_rows(filter);

        match format {
            OutputFormat::Json => {
                let numbered: Vec<NumberedRow> = rows
                    .iter()
                    .map(|(index, row)| NumberedRow {
                        number: index + 1,
                        row,
                    })
                    .collect();
                let output = serde_json::json!({
                    "name": name,
                    "tags": record.tags,
                    "rows": numbered,
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            OutputFormat::Text => print_table(name, record, &rows),
        }

        Ok(())
    }
}

fn print_table(name: &str, record: &TableRecord, rows: &[(usize, &Row)]) {
    println!("{}", name);
    println!("{}", "=".repeat(name.chars().count()));
    if !record.tags.is_empty() {
        println!("Tags: {}", record.tags.join(", "));
    }
    println!();

    if rows.is_empty() {
        if record.rows.is_empty() {
            println!("No rows yet. Add one with `dt row add`.");
        } else {
            println!("No rows match.");
        }
        return;
    }

    let width = record.rows.len().to_string().len();
    for (index, row) in rows {
        println!("{:>width$}. {}", index + 1, row, width = width);
    }
}

fn print_tags(name: &str, tags: &[String]) {
    if tags.is_empty() {
        println!("'{}' has no tags.", name);
    } else {
        println!("Tags for '{}': {}", name, tags.join(", "));
    }
}
