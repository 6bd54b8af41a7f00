//! # OrgHub API Server Library
//!
//! This library provides the core functionality for the OrgHub API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `audit`: Per-request audit recording
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod audit;
pub mod config;
pub mod error;
pub mod routes;
