//! # Requestline Common Library
//!
//! Shared code for the Requestline services including:
//! - Listener request and track DTOs
//! - Configuration file loading
//! - Admin token signing
//! - Timestamp helpers

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use error::{Error, Result};
