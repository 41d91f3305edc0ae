//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! Each service wraps these with framework-specific middleware (Axum, etc.).

pub mod auth;

pub use auth::{
    calculate_signature, issue_token, secrets_match, verify_token, AdminTokenError, TOKEN_TTL_MS,
};
