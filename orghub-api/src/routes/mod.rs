/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: health check endpoint
/// - `invitations`: issuing, listing, cancelling and redeeming invitations
/// - `members`: organisation member listing, role changes, direct add/remove

pub mod health;
pub mod invitations;
pub mod members;
