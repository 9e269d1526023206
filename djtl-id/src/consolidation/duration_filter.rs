//! Minimum-duration noise filter

use crate::models::ConsolidatedTrack;

/// Drop tracks shorter than `min_duration` seconds, preserving order
///
/// A track exactly `min_duration` long is kept.
pub fn filter_by_duration(
    tracks: Vec<ConsolidatedTrack>,
    min_duration: f64,
) -> Vec<ConsolidatedTrack> {
    tracks
        .into_iter()
        .filter(|track| track.duration() >= min_duration)
        .collect()
}
