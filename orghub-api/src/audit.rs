/// Per-request audit recording
///
/// Each invitation/member handler computes its outcome first, then
/// passes it here; recording happens on a detached task so it can
/// neither delay nor fail the request it describes. This replaces the
/// older pattern of mutating shared error/user pointers from deferred
/// callbacks: the outcome is an explicit value by the time we see it.

use orghub_shared::models::activity::{Activity, ActivityKind};
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiResult;

/// Records one audit row for a finished request
///
/// `user_id` is the acting user when the request carried a session;
/// the final error message is taken from the outcome.
pub fn record<T>(
    state: &AppState,
    kind: ActivityKind,
    user_id: Option<Uuid>,
    outcome: &ApiResult<T>,
) {
    let error = outcome.as_ref().err().map(|e| e.to_string());
    let db = state.db.clone();

    tokio::spawn(async move {
        if let Err(e) = Activity::record(&db, kind, user_id, error).await {
            tracing::warn!("Failed to record activity {}: {}", kind.as_str(), e);
        }
    });
}
