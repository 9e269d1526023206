//! MusicBrainz recording search
//!
//! Looks each consolidated track up by artist and title and attaches the
//! release title, release year and recording MBID of the best hit.
//!
//! Rate limited to 1 request/second per MusicBrainz policy.
//!
//! API Documentation: https://musicbrainz.org/doc/MusicBrainz_API/Search

use super::EnrichmentError;
use crate::models::{ConsolidatedTrack, TrackMetadata, TracklistEntry};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::time::Duration;

const MUSICBRAINZ_BASE_URL: &str = "https://musicbrainz.org/ws/2";
const USER_AGENT: &str = concat!(
    "djtl-id/",
    env!("CARGO_PKG_VERSION"),
    " ( https://musicbrainz.org/doc/MusicBrainz_API )"
);
/// Minimum search score (0-100) for a hit to be trusted
const MIN_SEARCH_SCORE: u8 = 80;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub recordings: Vec<SearchRecording>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRecording {
    pub id: String,
    #[serde(default)]
    pub score: u8,
    #[serde(default)]
    pub releases: Vec<SearchRelease>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRelease {
    pub title: String,
    pub date: Option<String>,
}

pub struct MusicBrainzEnricher {
    client: Client,
    base_url: String,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl MusicBrainzEnricher {
    pub fn new() -> Result<Self, EnrichmentError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| EnrichmentError::Setup(e.to_string()))?;

        Ok(Self {
            client,
            base_url: MUSICBRAINZ_BASE_URL.to_string(),
            rate_limiter: RateLimiter::direct(Quota::per_second(NonZeroU32::MIN)),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Search for one recording
    pub async fn lookup(
        &self,
        artist: &str,
        title: &str,
    ) -> Result<Option<TrackMetadata>, EnrichmentError> {
        self.rate_limiter.until_ready().await;

        let query = build_query(artist, title);
        let url = format!("{}/recording", self.base_url);
        tracing::debug!(%query, "Querying MusicBrainz");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query.as_str()), ("fmt", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichmentError::Api(status.as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(interpret_search(body))
    }

    /// Attach metadata to every track; lookups that fail are logged and skipped
    pub async fn enrich(&self, tracks: Vec<ConsolidatedTrack>) -> Vec<TracklistEntry> {
        let mut entries = Vec::with_capacity(tracks.len());

        for track in tracks {
            let metadata = match self.lookup(&track.artist, &track.title).await {
                Ok(found) => found,
                Err(e) => {
                    tracing::warn!(
                        title = %track.title,
                        artist = %track.artist,
                        error = %e,
                        "MusicBrainz lookup failed"
                    );
                    None
                }
            };
            entries.push(TracklistEntry { track, metadata });
        }

        entries
    }
}

/// Lucene query with quoted, escaped phrases
fn build_query(artist: &str, title: &str) -> String {
    let escape = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
    if artist.trim().is_empty() {
        format!("recording:\"{}\"", escape(title))
    } else {
        format!(
            "recording:\"{}\" AND artist:\"{}\"",
            escape(title),
            escape(artist)
        )
    }
}

/// Best hit above the score floor, or nothing
pub fn interpret_search(response: SearchResponse) -> Option<TrackMetadata> {
    let recording = response
        .recordings
        .into_iter()
        .find(|r| r.score >= MIN_SEARCH_SCORE)?;

    let release = recording.releases.into_iter().next();
    let release_year = release
        .as_ref()
        .and_then(|r| r.date.as_deref())
        .and_then(|d| d.get(..4))
        .and_then(|y| y.parse().ok());

    Some(TrackMetadata {
        release_title: release.map(|r| r.title),
        release_year,
        recording_mbid: Some(recording.id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_escaping() {
        assert_eq!(
            build_query("Daft Punk", "Face to \"Face\""),
            r#"recording:"Face to \"Face\"" AND artist:"Daft Punk""#
        );
        assert_eq!(build_query("", "Solo"), r#"recording:"Solo""#);
    }

    #[test]
    fn test_interpret_search_takes_first_release() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"recordings":[{"id":"mbid-1","score":100,"releases":[
                {"title":"Discovery","date":"2001-03-07"},
                {"title":"Musique Vol. 1","date":"2006"}
            ]}]}"#,
        )
        .unwrap();
        let metadata = interpret_search(response).unwrap();
        assert_eq!(metadata.release_title.as_deref(), Some("Discovery"));
        assert_eq!(metadata.release_year, Some(2001));
        assert_eq!(metadata.recording_mbid.as_deref(), Some("mbid-1"));
    }

    #[test]
    fn test_low_score_ignored() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"recordings":[{"id":"x","score":42}]}"#).unwrap();
        assert!(interpret_search(response).is_none());
    }

    #[test]
    fn test_missing_date() {
        let response: SearchResponse = serde_json::from_str(
            r#"{"recordings":[{"id":"x","score":95,"releases":[{"title":"White Label"}]}]}"#,
        )
        .unwrap();
        let metadata = interpret_search(response).unwrap();
        assert_eq!(metadata.release_year, None);
        assert_eq!(metadata.release_title.as_deref(), Some("White Label"));
    }
}
