//! # OrgHub Worker
//!
//! This is the background maintenance process for OrgHub. It runs the
//! invitation sweeper, which reclaims unredeemed invitations once per
//! day at local noon.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p orghub-worker
//! ```

use orghub_shared::db::pool::{create_pool, DatabaseConfig};
use orghub_worker::sweeper::Sweeper;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orghub_worker=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("OrgHub Worker v{} starting...", env!("CARGO_PKG_VERSION"));

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

    let db = create_pool(DatabaseConfig {
        url: database_url,
        ..Default::default()
    })
    .await?;

    let sweeper = Sweeper::new(db);
    let shutdown = sweeper.shutdown_token();
    let handle = tokio::spawn(sweeper.run());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, stopping sweeper...");

    shutdown.cancel();
    handle.await??;

    tracing::info!("Worker shut down");
    Ok(())
}
