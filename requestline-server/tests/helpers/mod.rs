//! Shared test fixtures: an in-memory PlayIt Live stand-in and builders
//! for playout items and track rows.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use requestline_server::catalog::TrackCatalog;
use requestline_server::matcher::SlotMatcher;
use requestline_server::playout::{
    AdditionalField, GatewayError, PlayoutItem, PlayoutItemKind, PlayoutLog, TrackGroup,
    TrackLibrary, TrackListItem,
};
use requestline_server::policy::{AllowAll, RequestPolicy};
use requestline_server::processor::RequestProcessor;
use requestline_server::queue::{NewRequest, RequestQueue};

// =============================================================================
// Builders
// =============================================================================

/// 2024-05-01 at `h`:00 UTC
pub fn hour(h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
}

fn item(guid: &str, kind: PlayoutItemKind, h: u32) -> PlayoutItem {
    PlayoutItem {
        guid: guid.to_string(),
        kind,
        title: None,
        start_time: None,
        hour_start_time: hour(h).to_rfc3339(),
        track_guid: None,
        additional_fields: None,
    }
}

pub fn break_note(guid: &str, text: &str, h: u32) -> PlayoutItem {
    PlayoutItem {
        additional_fields: Some(vec![AdditionalField {
            name: "Break Note".to_string(),
            value: text.to_string(),
        }]),
        ..item(guid, PlayoutItemKind::BreakNote, h)
    }
}

pub fn track(guid: &str, track_guid: &str, h: u32) -> PlayoutItem {
    PlayoutItem {
        track_guid: Some(track_guid.to_string()),
        ..item(guid, PlayoutItemKind::Track, h)
    }
}

pub fn row(guid: &str, artist_title: &str, track_type: &str) -> TrackListItem {
    serde_json::from_value(json!({
        "guid": guid,
        "values": [
            { "value": artist_title, "formatted": artist_title },
            { "value": track_type, "formatted": track_type }
        ]
    }))
    .unwrap()
}

pub fn listener(track_guid: &str, requested_by: &str, message: Option<&str>) -> NewRequest {
    NewRequest {
        track_guid: track_guid.to_string(),
        requested_by: requested_by.to_string(),
        message: message.map(str::to_string),
        ip_address: None,
    }
}

// =============================================================================
// Fake upstream
// =============================================================================

/// In-memory PlayIt Live
pub struct FakePlayout {
    pub current: Mutex<PlayoutItem>,
    pub hours: Mutex<HashMap<DateTime<Utc>, Vec<PlayoutItem>>>,
    pub groups: Mutex<Vec<TrackGroup>>,
    pub library: Mutex<Vec<TrackListItem>>,
    pub track_writes: Mutex<Vec<(String, String)>>,
    pub note_writes: Mutex<Vec<(String, String, String)>>,
    pub fail_reads: AtomicBool,
    pub fail_track_writes: AtomicBool,
    pub fail_note_writes: AtomicBool,
    /// Status returned by failing note writes
    pub note_failure_status: AtomicU16,
    pub current_item_calls: AtomicUsize,
    /// When set, `current_item` waits for a notification
    pub gate: Mutex<Option<Arc<Notify>>>,
}

impl FakePlayout {
    /// Current item `current_guid` in hour `h`, with the given hour contents
    pub fn new(current_guid: &str, h: u32, this_hour: Vec<PlayoutItem>, next_hour: Vec<PlayoutItem>) -> Self {
        let mut hours = HashMap::new();
        hours.insert(hour(h), this_hour);
        hours.insert(hour(h + 1), next_hour);

        Self {
            current: Mutex::new(track(current_guid, "ON-AIR", h)),
            hours: Mutex::new(hours),
            groups: Mutex::new(Vec::new()),
            library: Mutex::new(vec![
                row("S1", "Artist One - Song One", "Song"),
                row("S2", "Artist Two - Song Two", "Song"),
                row("S3", "Artist Three - Song Three", "Song"),
                row("J1", "Station ID", "Jingle"),
                row("ON-AIR", "Now Playing - Current", "Song"),
            ]),
            track_writes: Mutex::new(Vec::new()),
            note_writes: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_track_writes: AtomicBool::new(false),
            fail_note_writes: AtomicBool::new(false),
            note_failure_status: AtomicU16::new(500),
            current_item_calls: AtomicUsize::new(0),
            gate: Mutex::new(None),
        }
    }

    pub fn track_writes(&self) -> Vec<(String, String)> {
        self.track_writes.lock().unwrap().clone()
    }

    pub fn note_writes(&self) -> Vec<(String, String, String)> {
        self.note_writes.lock().unwrap().clone()
    }

    fn unavailable() -> GatewayError {
        GatewayError::Network("connection refused".to_string())
    }

    /// Apply a successful write to the stored hours, as the real log would
    fn update_item(&self, item_guid: &str, apply: impl Fn(&mut PlayoutItem)) {
        let mut hours = self.hours.lock().unwrap();
        for item in hours.values_mut().flatten() {
            if item.guid == item_guid {
                apply(item);
            }
        }
    }
}

#[async_trait]
impl PlayoutLog for FakePlayout {
    async fn current_item(&self) -> Result<PlayoutItem, GatewayError> {
        self.current_item_calls.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.current.lock().unwrap().clone())
    }

    async fn items_for_hour(&self, hour_start: DateTime<Utc>) -> Result<Vec<PlayoutItem>, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self
            .hours
            .lock()
            .unwrap()
            .get(&hour_start)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_track_for_item(&self, item_guid: &str, track_guid: &str) -> Result<(), GatewayError> {
        if self.fail_track_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Timeout("updateTrack".to_string()));
        }
        self.track_writes
            .lock()
            .unwrap()
            .push((item_guid.to_string(), track_guid.to_string()));
        self.update_item(item_guid, |item| {
            item.track_guid = Some(track_guid.to_string());
        });
        Ok(())
    }

    async fn set_break_note_for_item(
        &self,
        item_guid: &str,
        duration: &str,
        notes: &str,
    ) -> Result<(), GatewayError> {
        if self.fail_note_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Api {
                status: self.note_failure_status.load(Ordering::SeqCst),
                body: "boom".to_string(),
            });
        }
        self.note_writes.lock().unwrap().push((
            item_guid.to_string(),
            duration.to_string(),
            notes.to_string(),
        ));
        self.update_item(item_guid, |item| {
            item.additional_fields = Some(vec![AdditionalField {
                name: "Break Note".to_string(),
                value: notes.to_string(),
            }]);
        });
        Ok(())
    }
}

#[async_trait]
impl TrackLibrary for FakePlayout {
    async fn track_groups(&self) -> Result<Vec<TrackGroup>, GatewayError> {
        Ok(self.groups.lock().unwrap().clone())
    }

    async fn tracks(&self, _group: Option<&str>) -> Result<Vec<TrackListItem>, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        Ok(self.library.lock().unwrap().clone())
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub struct Harness {
    pub fake: Arc<FakePlayout>,
    pub catalog: Arc<TrackCatalog>,
    pub queue: RequestQueue,
    pub processor: Arc<RequestProcessor>,
}

/// Processor over `fake` with a loaded catalog
pub async fn harness(fake: FakePlayout) -> Harness {
    harness_with_policy(fake, Arc::new(AllowAll)).await
}

pub async fn harness_with_policy(fake: FakePlayout, policy: Arc<dyn RequestPolicy>) -> Harness {
    let fake = Arc::new(fake);
    let catalog = Arc::new(TrackCatalog::new(fake.clone(), None));
    catalog.refresh().await.expect("Catalog should load from fake");

    let queue = RequestQueue::in_memory(150);
    let processor = Arc::new(RequestProcessor::new(
        queue.clone(),
        SlotMatcher::new(fake.clone(), catalog.clone()),
        fake.clone(),
        policy,
    ));

    Harness {
        fake,
        catalog,
        queue,
        processor,
    }
}
