//! HTTP API handlers

pub mod auth;
pub mod health;
pub mod requests;

pub use auth::{auth_middleware, login};
pub use health::health_routes;
pub use requests::{delete_request, get_settings, list_requests, list_tracks, request_track};
