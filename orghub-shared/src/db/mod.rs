/// Database layer for OrgHub
///
/// This module provides PostgreSQL connection pooling. Models live in
/// the `models` module at crate root level; migrations are applied with
/// `sqlx::migrate!` from the workspace `migrations/` directory.
///
/// # Example
///
/// ```no_run
/// use orghub_shared::db::pool::{create_pool, DatabaseConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig {
///         url: std::env::var("DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pool = create_pool(config).await?;
///     Ok(())
/// }
/// ```

pub mod pool;
