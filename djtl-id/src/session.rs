//! Identification session
//!
//! Runs one full identification for one recording:
//!
//! FETCH → SEGMENT → RECOGNIZE (per backend) → CONSOLIDATE (per backend) → MERGE → ENRICH
//!
//! Audio is fetched and segmented once, then shared by every backend. A
//! backend that cannot be built, or whose records violate the ordering
//! contract, is reported in the session errors and the others continue.
//! Scratch files live in a temporary directory dropped with the session run.

use crate::audio::{AudioSource, Segmenter};
use crate::config::Settings;
use crate::consolidation::{BackendRecords, ConsolidationPipeline};
use crate::enrichment::MusicBrainzEnricher;
use crate::error::{ApiError, ApiResult};
use crate::models::{ConsolidatedTrack, Segment, TracklistEntry};
use crate::recognition::{build_recognizer, Recognizer};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

/// Persisted outcome of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub id: Uuid,
    pub url: String,
    pub timestamp: DateTime<Local>,
    /// Backends that produced a consolidated list
    pub recognizers_used: Vec<String>,
    /// Consolidated tracks per backend, before merging
    pub individual_results: BTreeMap<String, Vec<ConsolidatedTrack>>,
    /// Merged (and possibly enriched) tracklist
    pub combined_results: Vec<TracklistEntry>,
    /// Backend name → failure message
    pub errors: BTreeMap<String, String>,
    pub total_tracks: usize,
    /// Title reported by the downloader, used by exporters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SessionReport {
    /// `tracklist_<id>_<YYYYmmdd_HHMMSS>.json`
    pub fn file_name(&self) -> String {
        format!(
            "tracklist_{}_{}.json",
            self.id,
            self.timestamp.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write the report as pretty JSON under `dir`
    pub fn persist(&self, dir: &Path) -> ApiResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let body = serde_json::to_string_pretty(self)
            .map_err(|e| ApiError::Internal(format!("Failed to serialize report: {}", e)))?;
        std::fs::write(&path, body)?;
        info!(session_id = %self.id, path = %path.display(), "Session report saved");
        Ok(path)
    }
}

/// One identification run
pub struct IdentificationSession {
    id: Uuid,
    settings: Settings,
    cancel: CancellationToken,
}

impl IdentificationSession {
    pub fn new(settings: Settings) -> Self {
        Self {
            id: Uuid::new_v4(),
            settings,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Token that aborts outstanding recognition calls when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch, segment and identify `input` (URL or local path) with the
    /// configured backends
    pub async fn run(&self, input: &str) -> ApiResult<SessionReport> {
        info!(session_id = %self.id, input, "Starting identification session");

        let work_dir = tempfile::Builder::new().prefix("djtl-").tempdir()?;

        // FETCH
        let asset = AudioSource::parse(input).fetch(work_dir.path()).await?;

        // SEGMENT
        let segmenter = Segmenter::new(self.settings.chunk_duration)?;
        let segment_dir = work_dir.path().join("segments");
        std::fs::create_dir_all(&segment_dir)?;
        let audio_path = asset.path.clone();
        let segmented = tokio::task::spawn_blocking(move || segmenter.split(&audio_path, &segment_dir))
            .await
            .map_err(|e| ApiError::Internal(format!("Segmenting task failed: {}", e)))??;

        info!(
            session_id = %self.id,
            segments = segmented.segments.len(),
            total_duration = segmented.total_duration,
            "Audio segmented"
        );

        let mut errors = BTreeMap::new();
        let mut backends: Vec<Arc<dyn Recognizer>> = Vec::new();
        let params = self.settings.recognizer_params();
        for name in &self.settings.recognizers {
            match build_recognizer(name, &params) {
                Ok(recognizer) => backends.push(recognizer),
                Err(e) => {
                    warn!(session_id = %self.id, recognizer = %name, error = %e, "Recognizer unavailable");
                    errors.insert(name.clone(), e.to_string());
                }
            }
        }

        let mut report = self
            .identify_segments(input, &segmented.segments, backends, errors)
            .await?;
        report.title = asset.title;
        Ok(report)
    }

    /// RECOGNIZE → CONSOLIDATE → MERGE → ENRICH over already-split segments
    pub async fn identify_segments(
        &self,
        url: &str,
        segments: &[Segment],
        backends: Vec<Arc<dyn Recognizer>>,
        mut errors: BTreeMap<String, String>,
    ) -> ApiResult<SessionReport> {
        let pipeline = ConsolidationPipeline::new(self.settings.consolidation.clone())?;
        let runner = self
            .settings
            .runner()
            .with_cancellation(self.cancel.clone());

        let mut individual_results = BTreeMap::new();
        let mut recognizers_used = Vec::new();
        let mut lists = Vec::new();

        for backend in backends {
            let name = backend.name().to_string();
            let records = runner.run(Arc::clone(&backend), segments).await;

            match pipeline.consolidate_backend(&BackendRecords::new(name.clone(), records)) {
                Ok(tracks) => {
                    info!(session_id = %self.id, recognizer = %name, tracks = tracks.len(), "Backend consolidated");
                    individual_results.insert(name.clone(), tracks.clone());
                    recognizers_used.push(name);
                    lists.push(tracks);
                }
                Err(e) => {
                    warn!(session_id = %self.id, recognizer = %name, error = %e, "Backend records rejected");
                    errors.insert(name, e.to_string());
                }
            }
        }

        if lists.is_empty() && !errors.is_empty() {
            warn!(session_id = %self.id, "No backend produced results");
        }

        let combined = if lists.len() > 1 {
            pipeline.merge(lists)
        } else {
            lists.pop().unwrap_or_default()
        };

        let combined_results = if self.settings.enrich {
            match MusicBrainzEnricher::new() {
                Ok(enricher) => enricher.enrich(combined).await,
                Err(e) => {
                    warn!(error = %e, "MusicBrainz enrichment unavailable");
                    errors.insert("musicbrainz".to_string(), e.to_string());
                    TracklistEntry::from_tracks(combined)
                }
            }
        } else {
            TracklistEntry::from_tracks(combined)
        };

        let report = SessionReport {
            id: self.id,
            url: url.to_string(),
            timestamp: Local::now(),
            recognizers_used,
            individual_results,
            total_tracks: combined_results.len(),
            combined_results,
            errors,
            title: None,
        };

        info!(
            session_id = %self.id,
            total_tracks = report.total_tracks,
            failed_backends = report.errors.len(),
            "Identification session complete"
        );

        Ok(report)
    }
}
