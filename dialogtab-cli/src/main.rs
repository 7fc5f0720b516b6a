use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod session;

use commands::{ConfigCommand, RowCommand, SyncCommand, TableCommand};
use config::Config;

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Parser)]
#[command(name = "dt")]
#[command(version)]
#[command(about = "Keep dialogue tables for your characters", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Do not contact the server
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage tables
    Table(TableCommand),

    /// Edit rows of a table
    Row(RowCommand),

    /// Sync with the server
    Sync(SyncCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Table(cmd)) => {
            let mut store = session::open_store(&config, cli.offline, true).await?;
            cmd.run(&mut store).await?;
        }
        Some(Commands::Row(cmd)) => {
            let mut store = session::open_store(&config, cli.offline, true).await?;
            cmd.run(&mut store).await?;
        }
        Some(Commands::Sync(cmd)) => {
            // sync commands talk to the server themselves
            let mut store = session::open_store(&config, cli.offline, false).await?;
            cmd.run(&mut store, &config).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
