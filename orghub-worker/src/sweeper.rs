/// Expired-invitation sweeper
///
/// Invitations that were never redeemed are reclaimed by a daily sweep
/// that soft-deletes `invited` memberships older than the retention
/// window. The sweep runs at local noon; the predicate is age-based, so
/// a missed run is naturally covered by the next one.
///
/// # Lifecycle
///
/// ```text
/// Sweeper::run
///   └─> sleep until next local noon ──┐
///         └─> sweep_once              │  (repeat)
///               └────────────────────-┘
/// ```
///
/// The loop observes a [`CancellationToken`], so shutdown interrupts
/// the sleep instead of waiting out the remainder of the day.
///
/// # Example
///
/// ```no_run
/// use orghub_worker::sweeper::Sweeper;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> anyhow::Result<()> {
/// let sweeper = Sweeper::new(pool);
/// let shutdown = sweeper.shutdown_token();
///
/// let handle = tokio::spawn(sweeper.run());
/// // ... later
/// shutdown.cancel();
/// handle.await??;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Days, Duration, Local, LocalResult, NaiveDate, Utc};
use sqlx::PgPool;
use std::time::Duration as StdDuration;
use tokio_util::sync::CancellationToken;

use orghub_shared::models::membership::Membership;

/// Sweeper configuration
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Days an unredeemed invitation is kept before it is reclaimed
    pub retention_days: i64,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        SweeperConfig { retention_days: 30 }
    }
}

/// Daily sweeper for expired invitations
pub struct Sweeper {
    /// Database pool
    db: PgPool,

    /// Configuration
    config: SweeperConfig,

    /// Shutdown token
    shutdown_token: CancellationToken,
}

impl Sweeper {
    /// Creates a sweeper with the default 30-day retention
    pub fn new(db: PgPool) -> Self {
        Self::with_config(db, SweeperConfig::default())
    }

    /// Creates a sweeper with custom configuration
    pub fn with_config(db: PgPool, config: SweeperConfig) -> Self {
        Sweeper {
            db,
            config,
            shutdown_token: CancellationToken::new(),
        }
    }

    /// Returns the token that stops the sweep loop
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Runs the sweep loop until the shutdown token is cancelled
    pub async fn run(self) -> anyhow::Result<()> {
        tracing::info!(
            retention_days = self.config.retention_days,
            "Invitation sweeper started"
        );

        loop {
            let wait = duration_until_next_noon(Local::now());
            tracing::info!(wait_secs = wait.as_secs(), "Next sweep scheduled");

            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    tracing::info!("Invitation sweeper shutting down");
                    return Ok(());
                }
                _ = tokio::time::sleep(wait) => {
                    self.sweep_once().await;
                }
            }
        }
    }

    /// Performs one sweep
    ///
    /// Failures are logged and the loop continues; the next run covers
    /// whatever this one missed.
    pub async fn sweep_once(&self) {
        let cutoff = Utc::now() - Duration::days(self.config.retention_days);

        match Membership::purge_expired_invitations(&self.db, cutoff).await {
            Ok(purged) => {
                tracing::info!(purged, %cutoff, "Expired invitations reclaimed");
            }
            Err(e) => {
                tracing::error!("Invitation sweep failed: {}", e);
            }
        }
    }
}

/// Computes the time remaining until the next local noon
///
/// At exactly noon the next run is tomorrow's noon. On the rare date
/// where noon does not exist in the local timezone, retries in an hour.
pub fn duration_until_next_noon(now: DateTime<Local>) -> StdDuration {
    let next = match noon_on(now.date_naive()) {
        Some(noon) if now < noon => Some(noon),
        _ => noon_on(now.date_naive() + Days::new(1)),
    };

    match next {
        Some(next) => (next - now).to_std().unwrap_or(StdDuration::ZERO),
        None => StdDuration::from_secs(3600),
    }
}

fn noon_on(date: NaiveDate) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(12, 0, 0)?;
    match naive.and_local_timezone(Local) {
        LocalResult::Single(noon) => Some(noon),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => None,
    }
}
