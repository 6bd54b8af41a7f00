/// JWT session token generation and validation
///
/// Session tokens are signed with HS256 (HMAC-SHA256) and carry the
/// authenticated user and the organisation the session is bound to.
/// All organisation-scoped endpoints compare the path organisation
/// against the session-bound one.
///
/// # Security
///
/// - **Algorithm**: HS256
/// - **Expiration**: 24 hours
/// - **Validation**: signature, expiration, not-before and issuer checks
/// - **Secret**: at least 32 bytes, from configuration
///
/// # Example
///
/// ```
/// use orghub_shared::auth::jwt::{create_session_token, validate_session_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let organisation_id = Uuid::new_v4();
///
/// let claims = Claims::new(user_id, organisation_id);
/// let token = create_session_token(&claims, "your-secret-key")?;
///
/// let validated = validate_session_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Token issuer claim
const ISSUER: &str = "orghub";

/// Session lifetime
const SESSION_LIFETIME_HOURS: i64 = 24;

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Invalid issuer
    #[error("Invalid issuer")]
    InvalidIssuer,
}

/// JWT claims for a session token
///
/// Standard claims (`sub`, `iss`, `iat`, `exp`, `nbf`) plus the
/// organisation the session is bound to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user ID
    pub sub: Uuid,

    /// Issuer - always "orghub"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Organisation the session is scoped to (custom claim)
    pub organisation_id: Uuid,
}

impl Claims {
    /// Creates session claims with the default 24 hour lifetime
    pub fn new(user_id: Uuid, organisation_id: Uuid) -> Self {
        Self::with_expiration(user_id, organisation_id, Duration::hours(SESSION_LIFETIME_HOURS))
    }

    /// Creates session claims with a custom lifetime
    pub fn with_expiration(user_id: Uuid, organisation_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            organisation_id,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Creates a signed session token from claims
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails.
pub fn create_session_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a session token and extracts its claims
///
/// Verifies signature, expiration, not-before and issuer.
pub fn validate_session_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
