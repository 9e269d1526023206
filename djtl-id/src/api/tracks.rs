//! Tracklist API handlers
//!
//! POST /api/tracks/identify/url, POST /api/tracks/consolidate

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audio::AudioSource;
use crate::consolidation::{run_pipeline, BackendRecords};
use crate::error::{ApiError, ApiResult};
use crate::models::ConsolidatedTrack;
use crate::recognition::factory::canonical_name;
use crate::session::IdentificationSession;
use crate::AppState;
use djtl_common::human_time::format_timestamp;

/// POST /api/tracks/identify/url request
#[derive(Debug, Deserialize)]
pub struct IdentifyUrlRequest {
    pub url: String,
    /// Informational hint ("youtube", "soundcloud", ...); the downloader detects the site itself
    #[serde(default)]
    pub platform: Option<String>,
    /// Overrides the configured backends
    #[serde(default)]
    pub recognizers: Option<Vec<String>>,
}

/// One track as returned to API clients
#[derive(Debug, Serialize)]
pub struct TrackResponse {
    /// Formatted start, `MM:SS` or `HH:MM:SS`
    pub timestamp: String,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub title: String,
    pub artist: String,
    pub confidence: Option<f32>,
    pub source: String,
}

impl From<&ConsolidatedTrack> for TrackResponse {
    fn from(track: &ConsolidatedTrack) -> Self {
        Self {
            timestamp: format_timestamp(track.start),
            start: track.start,
            end: track.end,
            duration: track.duration(),
            title: track.title.clone(),
            artist: track.artist.clone(),
            confidence: track.confidence,
            source: track.source.clone(),
        }
    }
}

/// POST /api/tracks/identify/url response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyUrlResponse {
    pub id: Uuid,
    pub tracks: Vec<TrackResponse>,
    pub total_tracks: usize,
}

/// POST /api/tracks/consolidate request
#[derive(Debug, Deserialize)]
pub struct ConsolidateRequest {
    pub backends: Vec<BackendRecords>,
}

/// POST /api/tracks/consolidate response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidateResponse {
    pub tracks: Vec<ConsolidatedTrack>,
    pub total_tracks: usize,
}

/// POST /api/tracks/identify/url
///
/// Runs a full identification session and waits for it to finish. Only
/// http(s) URLs are accepted; local paths are a CLI-only input.
pub async fn identify_url(
    State(state): State<AppState>,
    Json(request): Json<IdentifyUrlRequest>,
) -> ApiResult<Json<IdentifyUrlResponse>> {
    let url = request.url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("url is required".to_string()));
    }
    if !matches!(AudioSource::parse(url), AudioSource::Url(_)) {
        return Err(ApiError::BadRequest(
            "url must start with http:// or https://".to_string(),
        ));
    }

    let mut settings = (*state.settings).clone();
    if let Some(names) = request.recognizers.filter(|n| !n.is_empty()) {
        if let Some(unknown) = names.iter().find(|n| canonical_name(n).is_none()) {
            return Err(ApiError::BadRequest(format!("Unknown recognizer '{}'", unknown)));
        }
        settings.recognizers = names;
    }

    let session = IdentificationSession::new(settings);
    tracing::info!(
        session_id = %session.id(),
        url,
        platform = request.platform.as_deref().unwrap_or("auto"),
        "Identify request accepted"
    );

    let report = match session.run(url).await {
        Ok(report) => report,
        Err(e) => {
            *state.last_error.write().await = Some(e.to_string());
            return Err(e);
        }
    };

    if let Err(e) = report.persist(&state.settings.output_dir) {
        tracing::warn!(session_id = %report.id, error = %e, "Failed to save session report");
    }

    let tracks: Vec<TrackResponse> = report
        .combined_results
        .iter()
        .map(|entry| TrackResponse::from(&entry.track))
        .collect();

    Ok(Json(IdentifyUrlResponse {
        id: report.id,
        total_tracks: tracks.len(),
        tracks,
    }))
}

/// POST /api/tracks/consolidate
///
/// Runs the consolidation engine over posted records. Records that break
/// the ordering contract are rejected with 422.
pub async fn consolidate(
    State(state): State<AppState>,
    Json(request): Json<ConsolidateRequest>,
) -> ApiResult<Json<ConsolidateResponse>> {
    let tracks = run_pipeline(&request.backends, &state.settings.consolidation)?;

    Ok(Json(ConsolidateResponse {
        total_tracks: tracks.len(),
        tracks,
    }))
}

pub fn track_routes() -> Router<AppState> {
    Router::new()
        .route("/api/tracks/identify/url", post(identify_url))
        .route("/api/tracks/consolidate", post(consolidate))
}
