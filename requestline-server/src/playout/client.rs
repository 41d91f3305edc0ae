//! PlayIt Live control API client
//!
//! Bearer-authenticated JSON over HTTP. Every request carries the
//! configured timeout so a stalled upstream surfaces as
//! [`GatewayError::Timeout`] instead of hanging a processing cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use requestline_common::time::format_hour_param;

use super::gateway::{GatewayError, PlayoutLog, TrackLibrary};
use super::models::{
    PlayoutItem, PlayoutItemsResponse, TrackGroup, TrackGroupsResponse, TrackListItem,
    TrackListResponse, UpdateBreakNoteBody, UpdateTrackBody,
};

const USER_AGENT: &str = concat!("requestline/", env!("CARGO_PKG_VERSION"));

/// Columns requested for track listings, in `TrackListItem::values` order
pub const TRACK_COLUMNS: &str = "artist_title,type";

/// PlayIt Live API client
pub struct PlayItLiveClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl PlayItLiveClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client.get(self.url(path)).bearer_auth(&self.api_key)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.http_client.post(self.url(path)).bearer_auth(&self.api_key)
    }

    /// Send and fail on non-2xx
    async fn send(request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, GatewayError> {
        let response = Self::send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PlayoutLog for PlayItLiveClient {
    async fn current_item(&self) -> Result<PlayoutItem, GatewayError> {
        Self::send_json(self.get("/api/control/liveAssist/playoutLog/currentItem")).await
    }

    async fn items_for_hour(
        &self,
        hour_start: DateTime<Utc>,
    ) -> Result<Vec<PlayoutItem>, GatewayError> {
        let hour = format_hour_param(hour_start);
        debug!(hour = %hour, "Fetching playout log hour");

        let request = self
            .get("/api/control/liveAssist/playoutLog/items")
            .query(&[("hour", hour.as_str()), ("includeEmpty", "true")]);

        let response: PlayoutItemsResponse = Self::send_json(request).await?;
        Ok(response.items)
    }

    async fn set_track_for_item(&self, item_guid: &str, track_guid: &str) -> Result<(), GatewayError> {
        let body = UpdateTrackBody {
            guid: item_guid,
            track_guid,
        };
        Self::send(self.post("/api/control/liveAssist/playoutLog/updateTrack").json(&body)).await?;
        Ok(())
    }

    async fn set_break_note_for_item(
        &self,
        item_guid: &str,
        duration: &str,
        notes: &str,
    ) -> Result<(), GatewayError> {
        let body = UpdateBreakNoteBody {
            guid: item_guid,
            duration,
            notes,
        };
        Self::send(self.post("/api/control/liveAssist/playoutLog/updateBreakNote").json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TrackLibrary for PlayItLiveClient {
    async fn track_groups(&self) -> Result<Vec<TrackGroup>, GatewayError> {
        let response: TrackGroupsResponse =
            Self::send_json(self.get("/api/control/trackGroups/listItems")).await?;
        Ok(response.track_groups)
    }

    async fn tracks(&self, track_group_guid: Option<&str>) -> Result<Vec<TrackListItem>, GatewayError> {
        let mut request = self
            .get("/api/control/tracks/listItems")
            .query(&[("columnIds", TRACK_COLUMNS)]);

        if let Some(group) = track_group_guid {
            request = request.query(&[("trackGroupGuid", group)]);
        }

        let response: TrackListResponse = Self::send_json(request).await?;
        Ok(response.tracks)
    }
}
