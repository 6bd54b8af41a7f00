/// Redis layer for OrgHub
///
/// # Modules
///
/// - `client`: connection management with automatic reconnection
/// - `invitations`: the ephemeral one-time invitation code store

pub mod client;
pub mod invitations;

pub use client::{RedisClient, RedisClientError, RedisConfig};
pub use invitations::InvitationCodes;
