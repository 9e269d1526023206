//! Final tracklist entries handed to exporters

use super::ConsolidatedTrack;
use serde::{Deserialize, Serialize};

/// Release details looked up after consolidation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_mbid: Option<String>,
}

/// One exported track plus optional enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracklistEntry {
    #[serde(flatten)]
    pub track: ConsolidatedTrack,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TrackMetadata>,
}

impl From<ConsolidatedTrack> for TracklistEntry {
    fn from(track: ConsolidatedTrack) -> Self {
        Self {
            track,
            metadata: None,
        }
    }
}

impl TracklistEntry {
    /// Wrap plain tracks without enrichment
    pub fn from_tracks(tracks: Vec<ConsolidatedTrack>) -> Vec<Self> {
        tracks.into_iter().map(Self::from).collect()
    }
}
