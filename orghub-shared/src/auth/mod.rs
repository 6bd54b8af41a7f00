/// Authentication utilities
///
/// # Modules
///
/// - [`jwt`]: HS256 session token generation and validation
/// - [`context`]: per-request authentication context extracted from a
///   validated session token
///
/// Session tokens are scoped to one `(user, organisation)` pair. The
/// only path that authenticates a user who previously had no
/// credential is invitation redemption, since redeeming the code
/// proves control of the invited email address.

pub mod context;
pub mod jwt;
