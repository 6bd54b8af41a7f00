/// Database models for OrgHub
///
/// This module contains all database models and their CRUD operations.
///
/// # Models
///
/// - `user`: user accounts, verification state and global roles
/// - `organisation`: tenants
/// - `membership`: the user↔organisation relation with invitation workflow state
/// - `activity`: per-request audit records

pub mod activity;
pub mod membership;
pub mod organisation;
pub mod user;
