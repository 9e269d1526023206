//! Audio acquisition and segmenting
//!
//! - [`source`]: resolves a URL or local path to a decodable file
//! - [`segmenter`]: cuts that file into fixed-duration mono WAV segments

pub mod segmenter;
pub mod source;

pub use segmenter::{SegmentedAudio, Segmenter};
pub use source::{AudioAsset, AudioSource};

use std::path::PathBuf;
use thiserror::Error;

/// Audio layer errors
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio file not found: {0}")]
    NotFound(PathBuf),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Decode failed: {0}")]
    Decode(String),

    #[error("Invalid chunk duration: {0}")]
    InvalidChunkDuration(f64),

    #[error("WAV write failed: {0}")]
    Wav(#[from] hound::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
