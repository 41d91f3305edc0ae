//! PlayIt Live wire types
//!
//! Only the fields the request pipeline reads are modelled; everything
//! else in the upstream payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Additional field name that carries the break note text
pub const BREAK_NOTE_FIELD: &str = "Break Note";

/// Break note text that marks a request slot (compared case-insensitively)
pub const REQUEST_MARKER: &str = "REQUEST";

/// Kind of a playout log item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayoutItemKind {
    Track,
    BreakNote,
    /// Any other upstream type (jingles, voice tracks, empty slots, ...)
    Other(String),
}

impl From<String> for PlayoutItemKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "track" => PlayoutItemKind::Track,
            "breakNote" => PlayoutItemKind::BreakNote,
            _ => PlayoutItemKind::Other(value),
        }
    }
}

impl From<PlayoutItemKind> for String {
    fn from(kind: PlayoutItemKind) -> Self {
        match kind {
            PlayoutItemKind::Track => "track".to_string(),
            PlayoutItemKind::BreakNote => "breakNote".to_string(),
            PlayoutItemKind::Other(value) => value,
        }
    }
}

impl Default for PlayoutItemKind {
    fn default() -> Self {
        PlayoutItemKind::Other(String::new())
    }
}

/// Named field attached to a playout log item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalField {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// One scheduled item of the playout log
///
/// Items arrive ordered by start time within their hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayoutItem {
    pub guid: String,
    #[serde(rename = "type", default)]
    pub kind: PlayoutItemKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    pub hour_start_time: String,
    #[serde(default)]
    pub track_guid: Option<String>,
    #[serde(default)]
    pub additional_fields: Option<Vec<AdditionalField>>,
}

impl PlayoutItem {
    pub fn fields(&self) -> &[AdditionalField] {
        self.additional_fields.as_deref().unwrap_or_default()
    }

    /// Break note whose "Break Note" field reads REQUEST (any case)
    pub fn is_request_break_note(&self) -> bool {
        self.kind == PlayoutItemKind::BreakNote
            && self.fields().iter().any(|field| {
                field.name == BREAK_NOTE_FIELD && field.value.to_uppercase() == REQUEST_MARKER
            })
    }

    /// Track guid bound to this item, if it is a track item
    pub fn bound_track(&self) -> Option<&str> {
        match self.kind {
            PlayoutItemKind::Track => self.track_guid.as_deref().filter(|g| !g.is_empty()),
            _ => None,
        }
    }
}

/// `GET playoutLog/items` response
#[derive(Debug, Clone, Deserialize)]
pub struct PlayoutItemsResponse {
    #[serde(default)]
    pub items: Vec<PlayoutItem>,
}

/// `POST playoutLog/updateTrack` body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrackBody<'a> {
    pub guid: &'a str,
    pub track_guid: &'a str,
}

/// `POST playoutLog/updateBreakNote` body
#[derive(Debug, Clone, Serialize)]
pub struct UpdateBreakNoteBody<'a> {
    pub guid: &'a str,
    pub duration: &'a str,
    pub notes: &'a str,
}

/// Upstream track group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TrackGroup {
    pub guid: String,
    pub name: String,
}

/// `GET trackGroups/listItems` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackGroupsResponse {
    #[serde(default)]
    pub track_groups: Vec<TrackGroup>,
}

/// One column value of a track listing row
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackValue {
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub formatted: Option<String>,
}

impl TrackValue {
    /// Raw value as text, falling back to the formatted rendering
    pub fn as_text(&self) -> Option<String> {
        match &self.value {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => self.formatted.clone(),
            other => Some(other.to_string()),
        }
    }
}

/// One row of a track listing; `values` follow the requested column order
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackListItem {
    pub guid: String,
    #[serde(default)]
    pub values: Vec<TrackValue>,
}

/// `GET tracks/listItems` response
#[derive(Debug, Clone, Deserialize)]
pub struct TrackListResponse {
    #[serde(default)]
    pub tracks: Vec<TrackListItem>,
}
