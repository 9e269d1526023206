//! JSON tracklist

use super::{ExportContext, ExportError};
use crate::models::TracklistEntry;
use djtl_common::human_time::format_timestamp;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct JsonTracklist<'a> {
    tracks: Vec<JsonTrack<'a>>,
    metadata: JsonMetadata,
}

#[derive(Debug, Serialize)]
struct JsonTrack<'a> {
    number: usize,
    start_time: f64,
    start_time_formatted: String,
    duration: f64,
    duration_formatted: String,
    title: &'a str,
    artist: &'a str,
    source: &'a str,
    #[serde(skip_serializing_if = "is_empty_slice")]
    corroborated_by: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    release_year: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    recording_mbid: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct JsonMetadata {
    track_count: usize,
    source: String,
    generated_at: String,
}

fn is_empty_slice(s: &&[String]) -> bool {
    s.is_empty()
}

pub fn render(entries: &[TracklistEntry], ctx: &ExportContext) -> Result<String, ExportError> {
    let tracks = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let track = &entry.track;
            let metadata = entry.metadata.as_ref();
            JsonTrack {
                number: i + 1,
                start_time: track.start,
                start_time_formatted: format_timestamp(track.start),
                duration: track.duration(),
                duration_formatted: format_timestamp(track.duration()),
                title: &track.title,
                artist: &track.artist,
                source: &track.source,
                corroborated_by: &track.corroborated_by,
                confidence: track.confidence,
                release_title: metadata.and_then(|m| m.release_title.as_deref()),
                release_year: metadata.and_then(|m| m.release_year),
                recording_mbid: metadata.and_then(|m| m.recording_mbid.as_deref()),
            }
        })
        .collect();

    let doc = JsonTracklist {
        tracks,
        metadata: JsonMetadata {
            track_count: entries.len(),
            source: ctx
                .title
                .clone()
                .unwrap_or_else(|| "Unknown source".to_string()),
            generated_at: ctx.generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        },
    };

    Ok(serde_json::to_string_pretty(&doc)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::test_support::{context, entries};

    #[test]
    fn test_render_shape() {
        let out = render(&entries(), &context()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["metadata"]["track_count"], 2);
        assert_eq!(value["metadata"]["source"], "Warehouse Session");
        assert_eq!(value["metadata"]["generated_at"], "2024-05-04 21:30:00");

        let first = &value["tracks"][0];
        assert_eq!(first["number"], 1);
        assert_eq!(first["duration_formatted"], "05:30");
        assert_eq!(first["corroborated_by"][0], "executable");
        assert_eq!(first["release_year"], 1987);

        let second = &value["tracks"][1];
        assert_eq!(second["start_time_formatted"], "01:00:30");
        assert!(second.get("corroborated_by").is_none());
        assert!(second.get("release_title").is_none());
    }
}
