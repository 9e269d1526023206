//! Audio sources
//!
//! Remote sets are fetched with `yt-dlp` (YouTube, SoundCloud, Mixcloud and
//! anything else it supports) and converted to MP3 so symphonia can decode
//! them. Local files are used in place.

use super::AudioError;
use std::path::{Path, PathBuf};
use tokio::process::Command;

const YT_DLP: &str = "yt-dlp";

/// Where the recording comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioSource {
    Url(String),
    Local(PathBuf),
}

impl AudioSource {
    /// `http(s)://` inputs are URLs, anything else a path
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AudioSource::Url(trimmed.to_string())
        } else {
            AudioSource::Local(PathBuf::from(trimmed))
        }
    }
}

/// A decodable local copy of the recording
#[derive(Debug, Clone)]
pub struct AudioAsset {
    pub path: PathBuf,
    pub title: Option<String>,
}

impl AudioSource {
    /// Resolve to a local file, downloading into `work_dir` when needed
    pub async fn fetch(&self, work_dir: &Path) -> Result<AudioAsset, AudioError> {
        match self {
            AudioSource::Local(path) => {
                if !path.is_file() {
                    return Err(AudioError::NotFound(path.clone()));
                }
                Ok(AudioAsset {
                    path: path.clone(),
                    title: path
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned()),
                })
            }
            AudioSource::Url(url) => download(url, work_dir).await,
        }
    }
}

async fn download(url: &str, work_dir: &Path) -> Result<AudioAsset, AudioError> {
    tracing::info!(url, "Downloading audio");

    let template = work_dir.join("source.%(ext)s");
    let output = Command::new(YT_DLP)
        .args(["--format", "bestaudio/best", "--no-playlist"])
        .args(["--extract-audio", "--audio-format", "mp3"])
        .args(["--print", "before_dl:title", "--print", "after_move:filepath"])
        .arg("--output")
        .arg(&template)
        .arg(url)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| AudioError::Download(format!("Failed to run {}: {}", YT_DLP, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AudioError::Download(format!(
            "{} exited with {:?}: {}",
            YT_DLP,
            output.status.code(),
            stderr.trim()
        )));
    }

    let (title, path) = parse_download_output(&String::from_utf8_lossy(&output.stdout))
        .ok_or_else(|| AudioError::Download("yt-dlp did not report an output file".to_string()))?;

    if !path.is_file() {
        return Err(AudioError::NotFound(path));
    }

    tracing::info!(path = %path.display(), title = ?title, "Audio downloaded");
    Ok(AudioAsset { path, title })
}

/// First printed line is the title, last the final file path
fn parse_download_output(stdout: &str) -> Option<(Option<String>, PathBuf)> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let path = PathBuf::from(*lines.last()?);
    let title = if lines.len() > 1 {
        Some(lines[0].to_string())
    } else {
        None
    };
    Some((title, path))
}
