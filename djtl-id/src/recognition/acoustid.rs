//! AcoustID recognizer
//!
//! Fingerprints each segment with `fpcalc -json` (Chromaprint CLI) and looks
//! the fingerprint up on the AcoustID web service. The best-scoring result's
//! first recording supplies the title and the comma-joined artist names.
//!
//! API Documentation: https://acoustid.org/webservice

use super::{Recognition, RecognitionError, Recognizer};
use crate::models::Segment;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

pub const BACKEND_NAME: &str = "acoustid";

const ACOUSTID_BASE_URL: &str = "https://api.acoustid.org/v2/lookup";
const USER_AGENT: &str = concat!("djtl-id/", env!("CARGO_PKG_VERSION"));
/// AcoustID allows 3 requests per second per client
const REQUESTS_PER_SECOND: u32 = 3;
/// AcoustID error code for an unknown client key
const INVALID_API_KEY_CODE: i64 = 4;

/// `fpcalc -json` output
#[derive(Debug, Deserialize)]
struct FpcalcOutput {
    duration: f64,
    fingerprint: String,
}

/// Lookup response
#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<LookupResult>,
    pub error: Option<LookupError>,
}

#[derive(Debug, Deserialize)]
pub struct LookupError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupResult {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    pub recordings: Option<Vec<LookupRecording>>,
}

#[derive(Debug, Deserialize)]
pub struct LookupRecording {
    pub id: String,
    pub title: Option<String>,
    #[serde(default)]
    pub artists: Vec<LookupArtist>,
}

#[derive(Debug, Deserialize)]
pub struct LookupArtist {
    pub name: String,
}

/// Fingerprint-based recognizer
pub struct AcoustIdRecognizer {
    client: Client,
    api_key: String,
    base_url: String,
    fpcalc_path: PathBuf,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl AcoustIdRecognizer {
    pub fn new(api_key: String, fpcalc_path: PathBuf) -> Result<Self, RecognitionError> {
        if api_key.trim().is_empty() {
            return Err(RecognitionError::Config(
                "AcoustID API key is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RecognitionError::Config(format!("HTTP client: {}", e)))?;

        let per_second = NonZeroU32::new(REQUESTS_PER_SECOND).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            client,
            api_key,
            base_url: ACOUSTID_BASE_URL.to_string(),
            fpcalc_path,
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Point lookups at another endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Run `fpcalc -json` on a segment file
    async fn fingerprint(&self, path: &Path) -> Result<(f64, String), RecognitionError> {
        let output = Command::new(&self.fpcalc_path)
            .arg("-json")
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                RecognitionError::Fatal(format!(
                    "Failed to run {}: {}",
                    self.fpcalc_path.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Fatal(format!(
                "fpcalc exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let parsed: FpcalcOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| RecognitionError::Fatal(format!("Unreadable fpcalc output: {}", e)))?;

        Ok((parsed.duration, parsed.fingerprint))
    }

    /// Query the lookup endpoint for one fingerprint
    pub async fn lookup(
        &self,
        fingerprint: &str,
        duration_secs: f64,
    ) -> Result<Recognition, RecognitionError> {
        self.rate_limiter.until_ready().await;

        let duration = (duration_secs.max(0.0) as u64).to_string();
        let params = [
            ("client", self.api_key.as_str()),
            ("meta", "recordings"),
            ("duration", duration.as_str()),
            ("fingerprint", fingerprint),
        ];

        tracing::debug!(duration_secs, "Querying AcoustID API");

        let response = self
            .client
            .post(&self.base_url)
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(RecognitionError::Transient(format!(
                "AcoustID returned {}",
                status
            )));
        }

        // Client errors still carry a JSON error body worth classifying
        let body: LookupResponse = response.json().await?;
        interpret_lookup(body)
    }
}

/// Reduce a lookup response to a recognition
pub fn interpret_lookup(response: LookupResponse) -> Result<Recognition, RecognitionError> {
    if response.status != "ok" {
        let (code, message) = response
            .error
            .map(|e| (e.code, e.message))
            .unwrap_or((0, "unknown error".to_string()));
        return if code == INVALID_API_KEY_CODE {
            Err(RecognitionError::Fatal(format!("Invalid AcoustID API key: {}", message)))
        } else {
            Err(RecognitionError::Transient(format!(
                "AcoustID error {}: {}",
                code, message
            )))
        };
    }

    let best = response
        .results
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score));

    let Some(best) = best else {
        return Ok(Recognition::NoMatch);
    };

    // A fingerprint match without recording metadata is not usable
    let Some(recording) = best.recordings.and_then(|r| r.into_iter().next()) else {
        tracing::debug!(acoustid = %best.id, "Match has no recordings");
        return Ok(Recognition::NoMatch);
    };

    let Some(title) = recording.title.filter(|t| !t.trim().is_empty()) else {
        return Ok(Recognition::NoMatch);
    };

    let artist = recording
        .artists
        .iter()
        .map(|a| a.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    tracing::debug!(
        acoustid = %best.id,
        recording = %recording.id,
        score = best.score,
        "AcoustID match"
    );

    Ok(Recognition::Match {
        title,
        artist,
        confidence: Some(best.score as f32),
    })
}

#[async_trait]
impl Recognizer for AcoustIdRecognizer {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError> {
        let (duration, fingerprint) = self.fingerprint(&segment.path).await?;
        if fingerprint.is_empty() {
            return Ok(Recognition::NoMatch);
        }
        self.lookup(&fingerprint, duration).await
    }
}
