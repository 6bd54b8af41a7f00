//! # OrgHub Worker Library
//!
//! This library provides the background maintenance functionality for
//! OrgHub.
//!
//! ## Modules
//!
//! - `sweeper`: Daily reclamation of expired, unredeemed invitations

pub mod sweeper;
