//! Console tracklist

use crate::models::TracklistEntry;
use djtl_common::human_time::format_timestamp;
use std::fmt::Write;

/// `01. [00:00] (05:30) - Title by Artist`
pub fn render(entries: &[TracklistEntry]) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        out.push_str("No tracks identified\n");
        return out;
    }

    out.push_str("Identified tracklist:\n");
    for (i, entry) in entries.iter().enumerate() {
        let track = &entry.track;
        let _ = writeln!(
            out,
            "{:02}. [{}] ({}) - {} by {}",
            i + 1,
            format_timestamp(track.start),
            format_timestamp(track.duration()),
            track.title,
            track.artist
        );
    }
    out
}
