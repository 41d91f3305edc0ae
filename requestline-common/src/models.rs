//! Shared data transfer types
//!
//! Serialized with camelCase field names, which is what the browser UI
//! consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog classification that makes a track eligible for a request slot
pub const SONG_TRACK_TYPE: &str = "Song";

/// Default upper bound on listener message length (characters)
pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 150;

/// A listener-submitted song request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerRequest {
    pub id: Uuid,
    pub track_guid: String,
    pub requested_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    pub requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl ListenerRequest {
    /// Pending until the processor stamps `processed_at`
    pub fn is_pending(&self) -> bool {
        self.processed_at.is_none()
    }

    /// Text written into the break note once the request is on air
    ///
    /// `REQUESTED BY: <name>` with `: <message>` appended when present.
    pub fn audit_note(&self) -> String {
        match &self.message {
            Some(message) => format!("REQUESTED BY: {}: {}", self.requested_by, message),
            None => format!("REQUESTED BY: {}", self.requested_by),
        }
    }
}

/// One entry of the station's track catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEntry {
    pub guid: String,
    pub artist_title: String,
    /// Upstream classification ("Song", "Jingle", ...)
    #[serde(rename = "type")]
    pub track_type: String,
}

impl TrackEntry {
    /// Only an exact "Song" classification closes a request slot
    pub fn is_song(&self) -> bool {
        self.track_type == SONG_TRACK_TYPE
    }
}

/// Public settings exposed to the submission form
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsDto {
    pub max_message_length: usize,
}
