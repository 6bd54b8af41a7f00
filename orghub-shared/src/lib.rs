//! # OrgHub Shared Library
//!
//! This crate contains shared types, storage access and business logic
//! used across the OrgHub API server and worker.
//!
//! ## Module Organization
//!
//! - `models`: database models (users, organisations, memberships, activities)
//! - `roles`: pure role-change planning and removal permission checks
//! - `auth`: session token creation/validation and request auth context
//! - `redis`: Redis client and the ephemeral invitation code store
//! - `email`: best-effort transactional email dispatch
//! - `db`: PostgreSQL connection pool
//! - `error`: the membership error taxonomy

pub mod auth;
pub mod db;
pub mod email;
pub mod error;
pub mod models;
pub mod redis;
pub mod roles;

/// Current version of the OrgHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
