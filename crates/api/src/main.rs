//! Weather Station API - Main Entry Point

use anyhow::anyhow;
use tracing::info;
use weather_api::{init_logging, run_server, ApiConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load()?;
    init_logging(&config).map_err(|e| anyhow!("Failed to set tracing subscriber: {}", e))?;

    info!("=== Weather Station API v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Serving observations from {}", config.database_url);

    run_server(&config).await
}
