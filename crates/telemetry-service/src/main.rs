//! Energy Log - Main Entry Point

use telemetry_service::{init_logging, run_server, ServiceConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    info!("=== Energy Log v{} ===", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::load()?;
    run_server(config).await?;

    info!("Energy log stopped");
    Ok(())
}
