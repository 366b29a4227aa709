mod bootstrap;
mod chain;
mod config;
mod error;
mod ledger;
mod reconcile;
mod scanner;
mod wallet;

use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reconciler=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("🚀 Starting wallet reconciler");

    let config = config::Config::from_env().context("invalid configuration")?;
    info!("🌐 Network: {}", config.network);

    let scanner = bootstrap::initialize_scanner(&config)
        .await
        .context("failed to initialize scanner")?;

    let shutdown = CancellationToken::new();
    let handle = scanner.start(shutdown.clone());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown requested, waiting for scanner to stop...");
    shutdown.cancel();

    if let Err(e) = handle.await {
        error!("Scanner task failed: {}", e);
    }

    info!("👋 Wallet reconciler stopped");
    Ok(())
}
