//! Plain-text tracklist

use super::ExportContext;
use crate::models::TracklistEntry;
use djtl_common::human_time::format_timestamp;
use std::fmt::Write;

pub fn render(entries: &[TracklistEntry], ctx: &ExportContext) -> String {
    let mut out = String::new();
    if let Some(title) = &ctx.title {
        let _ = writeln!(out, "# Tracklist for: {}\n", title);
    }

    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(
            out,
            "{:02}. [{}] {} - {}",
            i + 1,
            format_timestamp(entry.track.start),
            entry.track.title,
            entry.track.artist
        );
    }
    out
}
