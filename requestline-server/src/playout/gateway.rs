//! Upstream seams
//!
//! The request pipeline talks to the automation system only through these
//! traits. Production uses [`super::PlayItLiveClient`]; tests use in-memory
//! fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::models::{PlayoutItem, TrackGroup, TrackListItem};

/// Upstream call failure
///
/// Every variant means "upstream unavailable" for the current cycle; the
/// cycle runs again on its next tick.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Upstream request timed out: {0}")]
    Timeout(String),

    #[error("Upstream API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl GatewayError {
    /// Whether repeating the same call may succeed
    ///
    /// False for 4xx rejections other than 408 and 429.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) | GatewayError::Timeout(_) | GatewayError::Parse(_) => true,
            GatewayError::Api { status, .. } => *status >= 500 || *status == 429 || *status == 408,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GatewayError::Timeout(e.to_string())
        } else if e.is_decode() {
            GatewayError::Parse(e.to_string())
        } else {
            GatewayError::Network(e.to_string())
        }
    }
}

/// Read/write access to the live-assist playout log
#[async_trait]
pub trait PlayoutLog: Send + Sync {
    /// Item currently on air
    async fn current_item(&self) -> Result<PlayoutItem, GatewayError>;

    /// All items scheduled in the hour starting at `hour_start`, empty slots included
    async fn items_for_hour(&self, hour_start: DateTime<Utc>)
        -> Result<Vec<PlayoutItem>, GatewayError>;

    /// Bind `track_guid` to the future track item `item_guid`
    async fn set_track_for_item(&self, item_guid: &str, track_guid: &str)
        -> Result<(), GatewayError>;

    /// Overwrite a break note's duration and text
    async fn set_break_note_for_item(
        &self,
        item_guid: &str,
        duration: &str,
        notes: &str,
    ) -> Result<(), GatewayError>;
}

/// Read access to the station's track library
#[async_trait]
pub trait TrackLibrary: Send + Sync {
    async fn track_groups(&self) -> Result<Vec<TrackGroup>, GatewayError>;

    /// Tracks with `artist_title` and `type` columns, optionally limited to one group
    async fn tracks(&self, track_group_guid: Option<&str>)
        -> Result<Vec<TrackListItem>, GatewayError>;
}
