//! DrowsyGuard - Main Entry Point

use anyhow::{Context, Result};
use drowsy_monitor::{init_logging, run, Settings};
use std::path::PathBuf;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Optional settings file as the only argument
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref()).context("Failed to load settings")?;
    init_logging(&settings.log)?;

    info!("=== DrowsyGuard v{} ===", env!("CARGO_PKG_VERSION"));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping session");
                shutdown_tx.send_replace(true);
            }
            Err(e) => {
                warn!("Cannot listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    let summary = run(&settings, shutdown_rx).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
