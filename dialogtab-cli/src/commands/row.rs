use clap::{Args, Subcommand};
use std::collections::BTreeSet;

use dialogtab_core::Row;

use super::{resolve_table, row_index};
use crate::session::{self, Store};

#[derive(Args)]
pub struct RowCommand {
    #[command(subcommand)]
    pub command: RowSubcommand,
}

#[derive(Subcommand)]
pub enum RowSubcommand {
    /// Add a row to a table
    Add {
        /// The line of dialogue
        #[arg(long, short, default_value = "")]
        dialogue: String,

        /// Story or scene the line belongs to
        #[arg(long, short, default_value = "")]
        story: String,

        /// Mark the row as a favorite
        #[arg(long)]
        favorite: bool,

        /// Table name (defaults to the open table)
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Change the text of a row
    ///
    /// Clearing both dialogue and story removes the row on save.
    Edit {
        /// Row number as shown by `dt table show`
        number: usize,

        #[arg(long, short)]
        dialogue: Option<String>,

        #[arg(long, short)]
        story: Option<String>,

        /// Table name (defaults to the open table)
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Toggle the favorite mark on a row
    Fav {
        /// Row number as shown by `dt table show`
        number: usize,

        /// Table name (defaults to the open table)
        #[arg(long, short)]
        table: Option<String>,
    },

    /// Delete rows
    Delete {
        /// Row numbers as shown by `dt table show`
        #[arg(required = true)]
        numbers: Vec<usize>,

        /// Table name (defaults to the open table)
        #[arg(long, short)]
        table: Option<String>,
    },
}

impl RowCommand {
    pub async fn run(&self, store: &mut Store) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            RowSubcommand::Add {
                dialogue,
                story,
                favorite,
                table,
            } => {
                let name = resolve_table(store, table)?;
                let row = Row::new(dialogue.trim(), story.trim()).favorite(*favorite);
                if row.is_blank() {
                    return Err("A row needs dialogue or story text".into());
                }

                let index = store.update_table(&name, |record| Ok(record.push_row(row)))?;
                session::save(store).await?;
                println!("Added row {} to '{}'.", index + 1, name);
            }
            RowSubcommand::Edit {
                number,
                dialogue,
                story,
                table,
            } => {
                if dialogue.is_none() && story.is_none() {
                    return Err("Nothing to change: pass --dialogue and/or --story".into());
                }
                let name = resolve_table(store, table)?;
                let index = row_index(*number)?;

                store.update_table(&name, |record| {
                    let row = record.row_mut(index)?;
                    if let Some(dialogue) = dialogue {
                        row.dialogue = dialogue.trim().to_string();
                    }
                    if let Some(story) = story {
                        row.story = story.trim().to_string();
                    }
                    Ok(())
                })?;
                session::save(store).await?;
                println!("Updated row {} in '{}'.", number, name);
            }
            RowSubcommand::Fav { number, table } => {
                let name = resolve_table(store, table)?;
                let index = row_index(*number)?;

                let is_favorite =
                    store.update_table(&name, |record| record.toggle_favorite(index))?;
                session::save(store).await?;
                if is_favorite {
                    println!("♥ Row {} is now a favorite.", number);
                } else {
                    println!("Row {} is no longer a favorite.", number);
                }
            }
            RowSubcommand::Delete { numbers, table } => {
                let name = resolve_table(store, table)?;
                let indices = numbers
                    .iter()
                    .map(|n| row_index(*n))
                    .collect::<Result<BTreeSet<usize>, String>>()?;

                let removed = store.update_table(&name, |record| record.remove_rows(&indices))?;
                session::save(store).await?;
                println!(
                    "Deleted {} row{} from '{}'.",
                    removed,
                    if removed == 1 { "" } else { "s" },
                    name
                );
            }
        }

        Ok(())
    }
}
