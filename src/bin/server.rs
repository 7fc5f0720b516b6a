//! dialogtab sync server
//!
//! Stores every dialogue table in one JSON file and serves it to clients.
//!
//! # Configuration
//!
//! Environment variables:
//! - `DIALOGTAB_PORT`: Port to listen on (default: 3000)
//! - `DIALOGTAB_DATA_FILE`: JSON data file (default: ~/.local/share/dialogtab-server/tables.json)
//! - `DIALOGTAB_CONFIG`: Path to config file (default: ~/.config/dialogtab-server/config.yaml)
//!
//! # Config File Format
//!
//! ```yaml
//! port: 3000
//! data_file: tables.json   # relative to the config file
//! ```
//!
//! # Endpoints
//!
//! - `GET /health`: Health check
//! - `GET /api/tables`: Fetch every table
//! - `POST /api/tables`: Replace every table

use std::net::SocketAddr;

use dialogtab::{router, AppState, FileTableStore, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dialogtab_server=info,dialogtab=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;

    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }
    tracing::info!("Data file: {}", config.data_file.display());

    let state = AppState::new(FileTableStore::new(config.data_file));
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;

    tracing::info!("Server listening on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
