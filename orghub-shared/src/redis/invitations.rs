/// Ephemeral invitation code store
///
/// Invitation codes are opaque random strings mapped to a membership ID
/// with a fixed time-to-live. The issuer writes `code → membership_id`
/// with `SET .. EX`; the redeemer resolves the code with `GET`. Codes
/// are not deleted on redemption: the membership status check is the
/// idempotency guard against double redemption, and unredeemed codes
/// simply expire.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use super::client::{RedisClient, RedisClientError};

/// Invitation code time-to-live: 30 days
const CODE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Length of generated codes
const CODE_LEN: usize = 32;

/// Key prefix separating invitation codes from other Redis users
const KEY_PREFIX: &str = "invitation:";

/// Handle to the invitation code store
#[derive(Clone)]
pub struct InvitationCodes {
    client: RedisClient,
}

impl InvitationCodes {
    /// Creates a store handle over an existing Redis client
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    /// Issues a fresh code for a pending membership
    ///
    /// Generates a 32-character alphanumeric code from the thread-local
    /// CSPRNG and stores it with the 30-day TTL. Returns the raw code;
    /// it is never persisted anywhere else, so a lost code means a lost
    /// invitation.
    pub async fn issue(&self, membership_id: Uuid) -> Result<String, RedisClientError> {
        let code: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CODE_LEN)
            .map(char::from)
            .collect();

        let mut conn = self.client.get_connection();
        redis::cmd("SET")
            .arg(format!("{}{}", KEY_PREFIX, code))
            .arg(membership_id.to_string())
            .arg("EX")
            .arg(CODE_TTL_SECS)
            .query_async::<_, ()>(&mut conn)
            .await?;

        Ok(code)
    }

    /// Resolves a code to its membership ID
    ///
    /// Returns `None` for unknown or expired codes. A stored value that
    /// does not parse as a UUID is treated as a store failure.
    pub async fn lookup(&self, code: &str) -> Result<Option<Uuid>, RedisClientError> {
        let mut conn = self.client.get_connection();

        let value: Option<String> = redis::cmd("GET")
            .arg(format!("{}{}", KEY_PREFIX, code))
            .query_async(&mut conn)
            .await?;

        match value {
            None => Ok(None),
            Some(raw) => {
                let id = raw.parse::<Uuid>().map_err(|e| {
                    RedisClientError::CommandError(format!(
                        "Stored invitation value is not a UUID: {}",
                        e
                    ))
                })?;
                Ok(Some(id))
            }
        }
    }
}
