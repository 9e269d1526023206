//! Shazam recognizer
//!
//! Hands each segment to the SongRec CLI, which computes a Shazam signature
//! and queries the Shazam service:
//!
//! ```text
//! songrec audio-file-to-recognized-song <segment.wav>
//! ```
//!
//! stdout carries the raw Shazam response. A match has a non-empty
//! `matches` array and a `track` block whose `subtitle` is the artist.
//! Shazam reports no confidence.

use super::{Recognition, RecognitionError, Recognizer};
use crate::models::Segment;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub const BACKEND_NAME: &str = "shazam";

/// One lookup every 5 s, bursts of 3
const REQUEST_PERIOD: Duration = Duration::from_secs(5);
const REQUEST_BURST: u32 = 3;

/// Subset of the Shazam response SongRec prints
#[derive(Debug, Deserialize)]
pub struct ShazamResponse {
    #[serde(default)]
    pub matches: Vec<serde_json::Value>,
    pub track: Option<ShazamTrack>,
}

#[derive(Debug, Deserialize)]
pub struct ShazamTrack {
    pub title: Option<String>,
    /// Artist line as displayed by Shazam
    pub subtitle: Option<String>,
}

pub struct ShazamRecognizer {
    songrec_path: PathBuf,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl ShazamRecognizer {
    pub fn new(songrec_path: PathBuf) -> Result<Self, RecognitionError> {
        if songrec_path.as_os_str().is_empty() {
            return Err(RecognitionError::Config(
                "songrec_path is not configured".to_string(),
            ));
        }

        let quota = Quota::with_period(REQUEST_PERIOD)
            .ok_or_else(|| RecognitionError::Config("Invalid Shazam request period".to_string()))?
            .allow_burst(NonZeroU32::new(REQUEST_BURST).unwrap_or(NonZeroU32::MIN));

        tracing::info!(path = %songrec_path.display(), "Using SongRec for Shazam lookups");
        Ok(Self {
            songrec_path,
            rate_limiter: RateLimiter::direct(quota),
        })
    }

    pub fn songrec_path(&self) -> &Path {
        &self.songrec_path
    }
}

/// Reduce a Shazam response to a recognition
pub fn interpret_response(response: ShazamResponse) -> Recognition {
    if response.matches.is_empty() {
        return Recognition::NoMatch;
    }

    match response.track {
        Some(ShazamTrack {
            title: Some(title),
            subtitle,
        }) if !title.trim().is_empty() => Recognition::Match {
            title,
            artist: subtitle.unwrap_or_default(),
            confidence: None,
        },
        _ => Recognition::NoMatch,
    }
}

#[async_trait]
impl Recognizer for ShazamRecognizer {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError> {
        self.rate_limiter.until_ready().await;

        tracing::debug!(segment = %segment.path.display(), "Querying Shazam");

        let output = Command::new(&self.songrec_path)
            .arg("audio-file-to-recognized-song")
            .arg(&segment.path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RecognitionError::Fatal(format!(
                    "Failed to run {}: {}",
                    self.songrec_path.display(),
                    e
                ))
            })?;

        // SongRec exits non-zero on network and service errors
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Transient(format!(
                "songrec exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let response: ShazamResponse = serde_json::from_slice(&output.stdout).map_err(|e| {
            RecognitionError::Fatal(format!("Shazam response is not valid JSON: {}", e))
        })?;

        Ok(interpret_response(response))
    }
}
