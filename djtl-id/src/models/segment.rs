//! Audio segment handed to a recognizer

use std::path::PathBuf;

/// A fixed-duration slice of the source recording, written to disk
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Position in the recording (0-based)
    pub index: usize,
    /// Start offset in seconds
    pub start: f64,
    /// End offset in seconds
    pub end: f64,
    /// Decodable audio file containing only this slice
    pub path: PathBuf,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
