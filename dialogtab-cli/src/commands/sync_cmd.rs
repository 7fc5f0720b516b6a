//! Sync CLI commands for exchanging tables with the server.

use clap::{Args, Subcommand};

use dialogtab_core::{check_server, RemoteStatus, SyncReport};

use crate::config::Config;
use crate::session::{self, Store};

/// Sync with the server
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(subcommand)]
    command: Option<SyncSubcommand>,
}

#[derive(Debug, Subcommand)]
enum SyncSubcommand {
    /// Push every local table to the server
    Push,
    /// Show sync configuration and server status
    Status,
}

impl SyncCommand {
    pub async fn run(
        &self,
        store: &mut Store,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            None => self.pull(store).await,
            Some(SyncSubcommand::Push) => self.push(store).await,
            Some(SyncSubcommand::Status) => self.status(config).await,
        }
    }

    async fn pull(&self, store: &mut Store) -> Result<(), Box<dyn std::error::Error>> {
        match store.sync_from_server().await? {
            SyncReport::Updated(names) => {
                println!("Updated from server:");
                for name in &names {
                    println!("  ✓ {}", name);
                }
            }
            SyncReport::Unchanged => println!("Already up to date."),
            SyncReport::Skipped => print_not_configured(),
            SyncReport::Failed(e) => eprintln!("Warning: could not sync from server: {}", e),
        }
        Ok(())
    }

    async fn push(&self, store: &mut Store) -> Result<(), Box<dyn std::error::Error>> {
        let report = session::save(store).await?;
        match report.remote {
            RemoteStatus::Synced => println!(
                "Pushed {} table{} to server.",
                store.tables().len(),
                if store.tables().len() == 1 { "" } else { "s" }
            ),
            RemoteStatus::Skipped => print_not_configured(),
            // already reported by session::save
            RemoteStatus::Failed(_) => {}
        }
        Ok(())
    }

    async fn status(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        println!("Sync Configuration");
        println!("==================");
        println!();

        if !config.sync.is_configured() {
            println!("Status: Not configured");
            println!();
            print_setup_help();
            return Ok(());
        }

        let server_url = config.sync.server_url.as_deref().unwrap_or_default();
        println!("Server:        {}", server_url);
        println!(
            "Pull on start: {}",
            if config.sync.pull_on_start {
                "enabled"
            } else {
                "disabled"
            }
        );
        println!();

        print!("Server status: ");
        if check_server(server_url).await {
            println!("✓ reachable");
        } else {
            println!("✗ unreachable");
        }

        Ok(())
    }
}

fn print_not_configured() {
    println!("Sync is not configured (or --offline was given); tables are saved locally only.");
    println!();
    print_setup_help();
}

fn print_setup_help() {
    println!("To enable sync, add to your config file:");
    println!();
    println!("  sync:");
    println!("    server_url: \"http://localhost:3000\"");
    println!("    pull_on_start: true");
    println!();
    println!("Or set the environment variable:");
    println!("  DIALOGTAB_SERVER_URL");
}
