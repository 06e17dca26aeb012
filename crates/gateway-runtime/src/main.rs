//! # Address Gateway
//!
//! REST gateway serving address history, activity checks and network
//! information from a node and the indexer database.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, `GATEWAY_CONFIG` file, environment)
//! 2. Install logging (`DEBUG` / `RUST_LOG`)
//! 3. Connect the index database when `SQL_URI` is set
//! 4. Serve until Ctrl+C, letting in-flight requests finish

use anyhow::{Context, Result};
use gateway_runtime::{build_service, init_tracing, RuntimeConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::load().context("failed to load configuration")?;
    init_tracing(config.debug)?;

    info!(
        addr = %config.gateway.http_addr(),
        database = config.database.url.is_some(),
        "Starting gateway"
    );

    let service = build_service(&config).await?;
    service
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
            }
        })
        .await?;

    info!("Shutdown complete");
    Ok(())
}
