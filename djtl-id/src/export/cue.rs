//! CUE sheet for DJ software and audio players

use super::ExportContext;
use crate::models::TracklistEntry;
use djtl_common::human_time::format_cue_index;
use std::fmt::Write;

/// CUE strings cannot contain double quotes
fn cue_str(s: &str) -> String {
    s.replace('"', "'")
}

pub fn render(entries: &[TracklistEntry], ctx: &ExportContext) -> String {
    let audio_file = ctx.audio_file.as_deref().unwrap_or("AUDIOFILE.mp3");
    let title = ctx.title.as_deref().unwrap_or("DJ Mix");

    let mut out = String::new();
    out.push_str("PERFORMER \"Various Artists\"\n");
    let _ = writeln!(out, "TITLE \"{}\"", cue_str(title));
    let _ = writeln!(out, "FILE \"{}\" MP3", cue_str(audio_file));

    for (i, entry) in entries.iter().enumerate() {
        let _ = writeln!(out, "  TRACK {:02} AUDIO", i + 1);
        let _ = writeln!(out, "    TITLE \"{}\"", cue_str(&entry.track.title));
        let _ = writeln!(out, "    PERFORMER \"{}\"", cue_str(&entry.track.artist));
        let _ = writeln!(out, "    INDEX 01 {}", format_cue_index(entry.track.start));
    }
    out
}
