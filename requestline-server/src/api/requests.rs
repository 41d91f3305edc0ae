//! Track listing, submission and admin request endpoints

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::info;
use uuid::Uuid;

use requestline_common::models::{ListenerRequest, SettingsDto};

use crate::error::{ApiError, ApiResult};
use crate::queue::NewRequest;
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Public track listing entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub guid: String,
    pub artist_title: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTrackBody {
    #[serde(default)]
    pub track_guid: String,
    #[serde(default)]
    pub requested_by: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    fn ok() -> Json<Self> {
        Json(Self { success: true })
    }
}

// ============================================================================
// Public Endpoints
// ============================================================================

/// GET /api/tracks - requestable tracks
pub async fn list_tracks(State(state): State<AppState>) -> Json<Vec<TrackSummary>> {
    let tracks = state
        .catalog
        .list_requestable()
        .into_iter()
        .map(|t| TrackSummary {
            guid: t.guid,
            artist_title: t.artist_title,
        })
        .collect();
    Json(tracks)
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> Json<SettingsDto> {
    Json(SettingsDto {
        max_message_length: state.queue.max_message_length(),
    })
}

/// POST /api/requestTrack
///
/// 400 on invalid input, 409 when the track already has a pending request.
pub async fn request_track(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Result<Json<RequestTrackBody>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let artist_title = state
        .catalog
        .lookup(body.track_guid.trim())
        .map(|t| t.artist_title)
        .unwrap_or_else(|| "<not in catalog>".to_string());
    info!(
        track_guid = %body.track_guid,
        artist_title = %artist_title,
        requested_by = %body.requested_by,
        "Requesting track"
    );

    state
        .queue
        .submit(NewRequest {
            track_guid: body.track_guid,
            requested_by: body.requested_by,
            message: body.message,
            ip_address: connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()),
        })
        .await?;

    Ok(SuccessResponse::ok())
}

// ============================================================================
// Admin Endpoints
// ============================================================================

/// GET /api/requests - all requests, processed included
pub async fn list_requests(State(state): State<AppState>) -> Json<Vec<ListenerRequest>> {
    Json(state.queue.list_all().await)
}

/// DELETE /api/requests/:id
pub async fn delete_request(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SuccessResponse>> {
    let not_found = || ApiError::NotFound("Request not found".to_string());

    let id = Uuid::parse_str(&id).map_err(|_| not_found())?;

    if state.queue.delete(id).await {
        info!(request_id = %id, "Request deleted by admin");
        Ok(SuccessResponse::ok())
    } else {
        Err(not_found())
    }
}
