//! Detection records and consolidated tracks
//!
//! A `RawDetection` is one recognizer's answer for one segment. It is
//! produced once by the recognition layer and never mutated afterwards.
//! A `ConsolidatedTrack` is a run of detections believed to be the same
//! song; only the consolidator constructs them.

use serde::{Deserialize, Serialize};

/// One recognition result for one time segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Segment start offset in seconds
    pub segment_start: f64,
    /// Segment end offset in seconds (must be > segment_start)
    pub segment_end: f64,
    /// Track title, empty when nothing was recognized
    #[serde(default)]
    pub title: String,
    /// Track artist, possibly empty
    #[serde(default)]
    pub artist: String,
    /// False is an explicit "no match" for this segment
    pub recognized: bool,
    /// Backend that produced this record
    pub source: String,
    /// Backend-reported confidence (0.0-1.0), reporting only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl RawDetection {
    /// Recognized record
    pub fn matched(
        source: impl Into<String>,
        segment_start: f64,
        segment_end: f64,
        title: impl Into<String>,
        artist: impl Into<String>,
    ) -> Self {
        Self {
            segment_start,
            segment_end,
            title: title.into(),
            artist: artist.into(),
            recognized: true,
            source: source.into(),
            confidence: None,
        }
    }

    /// Explicit "no match" record
    pub fn unrecognized(source: impl Into<String>, segment_start: f64, segment_end: f64) -> Self {
        Self {
            segment_start,
            segment_end,
            title: String::new(),
            artist: String::new(),
            recognized: false,
            source: source.into(),
            confidence: None,
        }
    }

    /// Attach a backend confidence
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence.clamp(0.0, 1.0));
        self
    }
}

/// A merged, time-bounded track spanning one or more segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedTrack {
    /// Representative title
    pub title: String,
    /// Representative artist
    pub artist: String,
    /// `segment_start` of the first contributing record
    pub start: f64,
    /// `segment_end` of the last contributing record
    pub end: f64,
    /// Number of detections merged into this track
    pub contributing_count: usize,
    /// Backend identifier
    pub source: String,
    /// Other backends whose overlapping detections agreed on this region
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corroborated_by: Vec<String>,
    /// Highest confidence reported by any contributor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl ConsolidatedTrack {
    /// `end - start` in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// True when the two tracks share any stretch of the timeline
    pub fn overlaps(&self, other: &ConsolidatedTrack) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(start: f64, end: f64) -> ConsolidatedTrack {
        ConsolidatedTrack {
            title: "T".to_string(),
            artist: "A".to_string(),
            start,
            end,
            contributing_count: 1,
            source: "acoustid".to_string(),
            corroborated_by: Vec::new(),
            confidence: None,
        }
    }

    #[test]
    fn test_duration() {
        assert_eq!(track(30.0, 120.0).duration(), 90.0);
    }

    #[test]
    fn test_touching_tracks_do_not_overlap() {
        assert!(!track(0.0, 30.0).overlaps(&track(30.0, 60.0)));
        assert!(track(0.0, 31.0).overlaps(&track(30.0, 60.0)));
        assert!(track(10.0, 20.0).overlaps(&track(0.0, 90.0)));
    }

    #[test]
    fn test_confidence_is_clamped() {
        let detection = RawDetection::matched("x", 0.0, 30.0, "T", "A").with_confidence(1.7);
        assert_eq!(detection.confidence, Some(1.0));
    }

    #[test]
    fn test_unrecognized_deserializes_without_text() {
        let detection: RawDetection = serde_json::from_str(
            r#"{"segment_start":0.0,"segment_end":30.0,"recognized":false,"source":"acoustid"}"#,
        )
        .unwrap();
        assert!(!detection.recognized);
        assert!(detection.title.is_empty());
        assert!(detection.confidence.is_none());
    }
}
