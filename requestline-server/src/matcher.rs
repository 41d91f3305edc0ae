//! Request slot matcher
//!
//! Finds open request slots in the upcoming playout log. A slot is a
//! break note marked REQUEST followed by the nearest later track item
//! whose catalog entry is a Song.
//!
//! Slots are recomputed from scratch on every scan; nothing here is
//! remembered between processor cycles.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use requestline_common::time::{next_hour, parse_upstream_timestamp};

use crate::catalog::TrackCatalog;
use crate::playout::{GatewayError, PlayoutItem, PlayoutLog};

/// One on-air opportunity to honor a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSlot {
    /// Break note that receives the audit text
    pub break_note_item_guid: String,
    /// Track item that receives the requested track
    pub track_item_guid: String,
}

/// Scanner automaton
///
/// At most one break note is open at a time. A newer REQUEST break note
/// replaces an unresolved older one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    AwaitingTrack { break_note_item_guid: String },
}

impl ScanState {
    /// Advance over one item, possibly emitting a slot
    pub fn step<F>(self, item: &PlayoutItem, is_song: &F) -> (ScanState, Option<RequestSlot>)
    where
        F: Fn(&str) -> bool,
    {
        if item.is_request_break_note() {
            return (
                ScanState::AwaitingTrack {
                    break_note_item_guid: item.guid.clone(),
                },
                None,
            );
        }

        match self {
            ScanState::AwaitingTrack {
                break_note_item_guid,
            } => match item.bound_track() {
                Some(track_guid) if is_song(track_guid) => (
                    ScanState::Idle,
                    Some(RequestSlot {
                        break_note_item_guid,
                        track_item_guid: item.guid.clone(),
                    }),
                ),
                // Non-song tracks and everything else leave the break note open
                _ => (ScanState::AwaitingTrack { break_note_item_guid }, None),
            },
            ScanState::Idle => (ScanState::Idle, None),
        }
    }
}

/// Scan items in chronological order for request slots
pub fn scan_for_slots<F>(items: &[PlayoutItem], is_song: F) -> Vec<RequestSlot>
where
    F: Fn(&str) -> bool,
{
    let mut state = ScanState::Idle;
    let mut slots = Vec::new();

    for item in items {
        let (next, slot) = state.step(item, &is_song);
        state = next;
        slots.extend(slot);
    }

    slots
}

/// Items after `current_guid` in this hour, followed by all of next hour
///
/// If the current item is not in this hour's list, the whole hour is kept.
pub fn scan_window(
    current_guid: &str,
    this_hour: Vec<PlayoutItem>,
    next_hour: Vec<PlayoutItem>,
) -> Vec<PlayoutItem> {
    let start = this_hour
        .iter()
        .position(|item| item.guid == current_guid)
        .map(|index| index + 1)
        .unwrap_or(0);

    this_hour
        .into_iter()
        .skip(start)
        .chain(next_hour)
        .collect()
}

/// Reads the playout log and matches slots against the catalog
pub struct SlotMatcher {
    playout_log: Arc<dyn PlayoutLog>,
    catalog: Arc<TrackCatalog>,
}

impl SlotMatcher {
    pub fn new(playout_log: Arc<dyn PlayoutLog>, catalog: Arc<TrackCatalog>) -> Self {
        Self {
            playout_log,
            catalog,
        }
    }

    /// Open slots from now to the end of next hour, in air order
    pub async fn find_open_slots(&self) -> Result<Vec<RequestSlot>, GatewayError> {
        let current = self.playout_log.current_item().await?;
        let hour_start = hour_bucket(&current)?;

        let this_hour = self.playout_log.items_for_hour(hour_start).await?;
        let following = self.playout_log.items_for_hour(next_hour(hour_start)).await?;

        let window = scan_window(&current.guid, this_hour, following);

        let snapshot = self.catalog.snapshot();
        let slots = scan_for_slots(&window, |guid| snapshot.is_song(guid));

        debug!(
            current_item = %current.guid,
            hour = %hour_start,
            window = window.len(),
            slots = slots.len(),
            "Scanned playout log"
        );

        Ok(slots)
    }
}

fn hour_bucket(item: &PlayoutItem) -> Result<DateTime<Utc>, GatewayError> {
    parse_upstream_timestamp(&item.hour_start_time).ok_or_else(|| {
        GatewayError::Parse(format!(
            "Unreadable hourStartTime {:?} on item {}",
            item.hour_start_time, item.guid
        ))
    })
}
