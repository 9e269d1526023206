//! Data models for djtl-id
//!
//! - Raw per-segment detections and consolidated tracks
//! - Audio segments handed to recognizers
//! - Tracklist entries with optional release metadata

pub mod detection;
pub mod segment;
pub mod tracklist;

pub use detection::{ConsolidatedTrack, RawDetection};
pub use segment::Segment;
pub use tracklist::{TrackMetadata, TracklistEntry};
