//! Tracklist exporters
//!
//! Each format is a pure renderer from a frozen tracklist to a `String`;
//! [`export_all`] writes the requested formats to
//! `<output_dir>/<base_name>.<ext>`.

pub mod console;
pub mod cue;
pub mod html;
pub mod json;
pub mod text;

use crate::models::TracklistEntry;
use chrono::{DateTime, Local};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Console,
    Txt,
    Json,
    Cue,
    Html,
}

impl ExportFormat {
    /// File extension, `None` for console output
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ExportFormat::Console => None,
            ExportFormat::Txt => Some("txt"),
            ExportFormat::Json => Some("json"),
            ExportFormat::Cue => Some("cue"),
            ExportFormat::Html => Some("html"),
        }
    }

    /// Parse a comma-separated list, dropping unknown names with a warning
    pub fn parse_list(list: &str) -> Vec<ExportFormat> {
        let mut formats = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match name.parse::<ExportFormat>() {
                Ok(format) if !formats.contains(&format) => formats.push(format),
                Ok(_) => {}
                Err(_) => tracing::warn!(format = name, "Ignoring unknown export format"),
            }
        }
        formats
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "console" => Ok(ExportFormat::Console),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "json" => Ok(ExportFormat::Json),
            "cue" => Ok(ExportFormat::Cue),
            "html" => Ok(ExportFormat::Html),
            other => Err(format!("unknown export format '{}'", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Console => "console",
            ExportFormat::Txt => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Cue => "cue",
            ExportFormat::Html => "html",
        };
        f.write_str(name)
    }
}

/// Descriptive context shared by all renderers
#[derive(Debug, Clone)]
pub struct ExportContext {
    /// Set title (video title, file stem)
    pub title: Option<String>,
    /// Where the recording came from
    pub source_url: Option<String>,
    /// Audio file name referenced by CUE sheets
    pub audio_file: Option<String>,
    pub generated_at: DateTime<Local>,
}

impl Default for ExportContext {
    fn default() -> Self {
        Self {
            title: None,
            source_url: None,
            audio_file: None,
            generated_at: Local::now(),
        }
    }
}

/// `tracklist_<unix_ts>`
pub fn default_base_name(ctx: &ExportContext) -> String {
    format!("tracklist_{}", ctx.generated_at.timestamp())
}

/// Render one format
pub fn render(
    format: ExportFormat,
    entries: &[TracklistEntry],
    ctx: &ExportContext,
) -> Result<String, ExportError> {
    Ok(match format {
        ExportFormat::Console => console::render(entries),
        ExportFormat::Txt => text::render(entries, ctx),
        ExportFormat::Json => json::render(entries, ctx)?,
        ExportFormat::Cue => cue::render(entries, ctx),
        ExportFormat::Html => html::render(entries, ctx),
    })
}

/// Write every file-backed format, returning the paths written
pub fn export_all(
    entries: &[TracklistEntry],
    formats: &[ExportFormat],
    ctx: &ExportContext,
    output_dir: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>, ExportError> {
    std::fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for format in formats {
        let Some(ext) = format.extension() else {
            continue;
        };
        let path = output_dir.join(format!("{}.{}", base_name, ext));
        std::fs::write(&path, render(*format, entries, ctx)?)?;
        tracing::info!(format = %format, path = %path.display(), "Tracklist exported");
        written.push(path);
    }

    Ok(written)
}
