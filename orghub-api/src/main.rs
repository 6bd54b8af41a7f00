//! # OrgHub API Server
//!
//! This is the main API server for OrgHub, providing organisation
//! membership endpoints: invitation issuance and redemption, member
//! listing, role management and member removal.
//!
//! ## Architecture
//!
//! The API server is built with Axum and provides:
//! - Invitation endpoints (issue, list, cancel, redeem)
//! - Member endpoints (list, direct add, role change, removal)
//! - JWT session authentication bound to one organisation
//! - Best-effort invitation email dispatch
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p orghub-api
//! ```

use orghub_api::app::{build_router, AppState};
use orghub_api::config::Config;
use orghub_shared::db::pool::{create_pool, DatabaseConfig};
use orghub_shared::email::{EmailClient, EmailConfig, Mailer};
use orghub_shared::redis::{InvitationCodes, RedisClient, RedisConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orghub_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "OrgHub API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env()?;

    let db_config = DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..DatabaseConfig::default()
    };
    let db = create_pool(db_config).await?;

    sqlx::migrate!("../migrations").run(&db).await?;
    tracing::info!("Database migrations applied");

    let redis = RedisClient::new(RedisConfig::from_env()?).await?;
    let codes = InvitationCodes::new(redis);

    let mailer = Mailer::spawn(EmailClient::new(EmailConfig::from_env()?));

    let bind_address = config.bind_address();
    let state = AppState::new(db, codes, mailer, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
