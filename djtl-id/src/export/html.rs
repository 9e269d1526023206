//! Standalone HTML tracklist page

use super::ExportContext;
use crate::models::TracklistEntry;
use djtl_common::human_time::format_timestamp;
use std::fmt::Write;

const STYLE: &str = r#"
    body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; max-width: 860px; margin: 0 auto; padding: 24px; background: #f5f5f5; color: #222; }
    h1 { border-bottom: 2px solid #333; padding-bottom: 8px; }
    .source-link { margin-bottom: 20px; }
    .track-container { display: flex; background: #fff; border-radius: 6px; margin-bottom: 10px; padding: 12px; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
    .track-number { font-weight: bold; width: 40px; }
    .track-time { font-family: monospace; width: 90px; color: #555; }
    .track-info { flex: 1; }
    .track-title { font-weight: bold; }
    .track-artist { color: #444; }
    .track-duration, .track-release { font-size: 0.85em; color: #777; }
    .footer { margin-top: 30px; font-size: 0.8em; color: #888; text-align: center; }
"#;

pub(crate) fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn render(entries: &[TracklistEntry], ctx: &ExportContext) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    let page_title = ctx.title.as_deref().unwrap_or("DJ Set Tracklist");
    let _ = writeln!(out, "<title>{}</title>", escape_html(page_title));
    let _ = writeln!(out, "<style>{}</style>\n</head>\n<body>", STYLE);

    match &ctx.title {
        Some(title) => {
            let _ = writeln!(out, "<h1>Tracklist: {}</h1>", escape_html(title));
        }
        None => out.push_str("<h1>DJ Set Tracklist</h1>\n"),
    }

    if let Some(url) = &ctx.source_url {
        let url = escape_html(url);
        let _ = writeln!(
            out,
            "<div class=\"source-link\">Source: <a href=\"{url}\" target=\"_blank\">{url}</a></div>"
        );
    }

    for (i, entry) in entries.iter().enumerate() {
        let track = &entry.track;
        let _ = writeln!(out, "<div class=\"track-container\">");
        let _ = writeln!(out, "  <div class=\"track-number\">{:02}</div>", i + 1);
        let _ = writeln!(out, "  <div class=\"track-time\">{}</div>", format_timestamp(track.start));
        let _ = writeln!(out, "  <div class=\"track-info\">");
        let _ = writeln!(out, "    <div class=\"track-title\">{}</div>", escape_html(&track.title));
        let _ = writeln!(out, "    <div class=\"track-artist\">{}</div>", escape_html(&track.artist));
        let _ = writeln!(
            out,
            "    <div class=\"track-duration\">Duration: {}</div>",
            format_timestamp(track.duration())
        );

        if let Some(release) = entry.metadata.as_ref().and_then(|m| m.release_title.as_deref()) {
            let year = entry
                .metadata
                .as_ref()
                .and_then(|m| m.release_year)
                .map(|y| format!(" ({})", y))
                .unwrap_or_default();
            let _ = writeln!(
                out,
                "    <div class=\"track-release\">{}{}</div>",
                escape_html(release),
                year
            );
        }

        out.push_str("  </div>\n</div>\n");
    }

    let _ = writeln!(
        out,
        "<div class=\"footer\"><p>Generated on {} by djtl-id</p></div>\n</body>\n</html>",
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S")
    );
    out
}
