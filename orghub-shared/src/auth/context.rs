/// Per-request authentication context
///
/// After the API's JWT middleware validates a session token, it inserts
/// an `AuthContext` into the request extensions. Handlers extract it
/// with Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use orghub_shared::auth::context::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}, Organisation: {}", auth.user_id, auth.organisation_id)
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Organisation the session is bound to
    pub organisation_id: Uuid,
}

impl AuthContext {
    /// Creates an auth context from validated session claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            organisation_id: claims.organisation_id,
        }
    }
}
