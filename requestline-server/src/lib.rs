//! requestline-server library
//!
//! Listener song requests for a PlayIt Live station: a track catalog
//! cache, an in-memory request queue, and a background processor that
//! injects requested tracks into REQUEST break-note slots of the playout
//! log.

use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod matcher;
pub mod playout;
pub mod policy;
pub mod processor;
pub mod queue;
pub mod scheduler;

pub use crate::error::{ApiError, ApiResult};

use crate::catalog::TrackCatalog;
use crate::queue::RequestQueue;

/// Admin credentials and token signing secret
#[derive(Clone)]
pub struct AdminAuth {
    /// Login password; `None` disables admin login
    pub password: Option<String>,
    pub token_secret: String,
}

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<TrackCatalog>,
    pub queue: RequestQueue,
    pub auth: Arc<AdminAuth>,
    /// Built web UI, served at `/` when present
    pub static_dir: Option<PathBuf>,
}

impl AppState {
    pub fn new(catalog: Arc<TrackCatalog>, queue: RequestQueue, auth: AdminAuth) -> Self {
        Self {
            catalog,
            queue,
            auth: Arc::new(auth),
            static_dir: None,
        }
    }

    pub fn with_static_dir(mut self, static_dir: Option<PathBuf>) -> Self {
        self.static_dir = static_dir;
        self
    }
}

/// Build application router
///
/// Public: track listing, settings, submission, login, health.
/// Admin (bearer token): request listing and deletion.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};
    use tower_http::services::{ServeDir, ServeFile};
    use tower_http::trace::TraceLayer;

    let protected = Router::new()
        .route("/api/requests", get(api::list_requests))
        .route("/api/requests/:id", delete(api::delete_request))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/tracks", get(api::list_tracks))
        .route("/api/settings", get(api::get_settings))
        .route("/api/requestTrack", post(api::request_track))
        .route("/api/login", post(api::login))
        .merge(api::health_routes());

    let mut router = Router::new().merge(protected).merge(public);

    if let Some(dir) = &state.static_dir {
        let index = dir.join("index.html");
        router = router.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
