//! Track catalog cache
//!
//! Read-through cache of the station's track library and its requestable
//! subset. A refresh builds a complete [`CatalogSnapshot`] off to the side
//! and publishes it with a single pointer swap, so readers never see a
//! half-built catalog and never wait on a refresh in progress.
//!
//! A failed refresh leaves the previous snapshot in place.

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use requestline_common::models::TrackEntry;
use requestline_common::time;

use crate::playout::{GatewayError, TrackLibrary, TrackListItem};

/// Immutable view of the catalog at one refresh
#[derive(Debug, Default)]
pub struct CatalogSnapshot {
    by_guid: HashMap<String, TrackEntry>,
    requestable: Vec<TrackEntry>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl CatalogSnapshot {
    pub fn lookup(&self, guid: &str) -> Option<&TrackEntry> {
        self.by_guid.get(guid)
    }

    /// Whether `guid` is in the catalog and classified exactly as a Song
    pub fn is_song(&self, guid: &str) -> bool {
        self.lookup(guid).map(TrackEntry::is_song).unwrap_or(false)
    }

    pub fn requestable(&self) -> &[TrackEntry] {
        &self.requestable
    }

    pub fn len(&self) -> usize {
        self.by_guid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_guid.is_empty()
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

/// Which tracks listeners may pick from
#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestableScope {
    /// No group configured: the whole library
    All,
    /// Configured group, resolved to its upstream guid
    Group(String),
    /// Configured group name not found upstream: nothing is requestable
    Unmatched,
}

/// Counts from a successful refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSummary {
    pub tracks: usize,
    pub requestable: usize,
}

/// Track catalog cache
pub struct TrackCatalog {
    library: Arc<dyn TrackLibrary>,
    requestable_group: Option<String>,
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl TrackCatalog {
    /// Create an empty catalog; nothing is fetched until [`Self::refresh`]
    pub fn new(library: Arc<dyn TrackLibrary>, requestable_group: Option<String>) -> Self {
        Self {
            library,
            requestable_group: requestable_group.filter(|name| !name.trim().is_empty()),
            snapshot: ArcSwap::from_pointee(CatalogSnapshot::default()),
        }
    }

    /// Current snapshot (wait-free)
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    pub fn lookup(&self, guid: &str) -> Option<TrackEntry> {
        self.snapshot.load().lookup(guid).cloned()
    }

    /// Requestable tracks in upstream listing order
    pub fn list_requestable(&self) -> Vec<TrackEntry> {
        self.snapshot.load().requestable.clone()
    }

    /// Whether any refresh has succeeded yet
    pub fn is_loaded(&self) -> bool {
        self.snapshot.load().refreshed_at.is_some()
    }

    /// Fetch the library and publish a new snapshot
    ///
    /// On error the previous snapshot stays published.
    pub async fn refresh(&self) -> Result<RefreshSummary, GatewayError> {
        let scope = self.resolve_scope().await?;

        let all_rows = self.library.tracks(None).await?;
        let all = map_rows(all_rows);

        let requestable = match &scope {
            RequestableScope::All => all.clone(),
            RequestableScope::Group(guid) => map_rows(self.library.tracks(Some(guid)).await?),
            RequestableScope::Unmatched => Vec::new(),
        };

        let summary = RefreshSummary {
            tracks: all.len(),
            requestable: requestable.len(),
        };

        let by_guid = all
            .into_iter()
            .map(|entry| (entry.guid.clone(), entry))
            .collect();

        self.snapshot.store(Arc::new(CatalogSnapshot {
            by_guid,
            requestable,
            refreshed_at: Some(time::now()),
        }));

        info!(
            tracks = summary.tracks,
            requestable = summary.requestable,
            "Track catalog refreshed"
        );

        Ok(summary)
    }

    /// Refresh, logging and swallowing failures
    pub async fn refresh_logged(&self) {
        if let Err(e) = self.refresh().await {
            let snapshot = self.snapshot.load();
            warn!(
                error = %e,
                cached_tracks = snapshot.len(),
                "Track catalog refresh failed, keeping previous catalog"
            );
        }
    }

    async fn resolve_scope(&self) -> Result<RequestableScope, GatewayError> {
        let Some(name) = &self.requestable_group else {
            return Ok(RequestableScope::All);
        };

        let groups = self.library.track_groups().await?;
        let wanted = name.to_lowercase();

        match groups.into_iter().find(|g| g.name.to_lowercase() == wanted) {
            Some(group) => Ok(RequestableScope::Group(group.guid)),
            None => {
                warn!(
                    group = %name,
                    "Requestable track group not found upstream, no tracks will be requestable"
                );
                Ok(RequestableScope::Unmatched)
            }
        }
    }
}

/// Map listing rows (`artist_title`, `type` columns) to catalog entries
fn map_rows(rows: Vec<TrackListItem>) -> Vec<TrackEntry> {
    rows.into_iter()
        .filter_map(|row| {
            let artist_title = row.values.first().and_then(|v| v.as_text());
            let track_type = row.values.get(1).and_then(|v| v.as_text());

            match (artist_title, track_type) {
                (Some(artist_title), Some(track_type)) => Some(TrackEntry {
                    guid: row.guid,
                    artist_title,
                    track_type,
                }),
                _ => {
                    debug!(guid = %row.guid, "Skipping track row with missing columns");
                    None
                }
            }
        })
        .collect()
}
