//! Consolidation errors
//!
//! Data-integrity errors mean an upstream producer broke the ordered-record
//! contract. They carry enough context (backend, record index, timestamps)
//! to find the offending producer.

use thiserror::Error;

/// Consolidation pipeline errors
#[derive(Debug, Error, PartialEq)]
pub enum ConsolidationError {
    /// Rejected at pipeline construction
    #[error("Invalid consolidation config: {0}")]
    InvalidConfig(String),

    /// Segment bounds are negative, non-finite, or empty
    #[error("Malformed record {index} from '{backend}': segment [{start}, {end}) is invalid")]
    MalformedSegment {
        backend: String,
        index: usize,
        start: f64,
        end: f64,
    },

    /// Record starts before its predecessor
    #[error("Record {index} from '{backend}' is out of order: starts at {start} after a record starting at {previous_start}")]
    OutOfOrder {
        backend: String,
        index: usize,
        start: f64,
        previous_start: f64,
    },

    /// Record overlaps its predecessor
    #[error("Record {index} from '{backend}' overlaps its predecessor: starts at {start} before previous end {previous_end}")]
    Overlapping {
        backend: String,
        index: usize,
        start: f64,
        previous_end: f64,
    },

    /// Record was attributed to a different backend than its batch
    #[error("Record {index} belongs to '{found}' but was submitted with backend '{expected}'")]
    SourceMismatch {
        expected: String,
        found: String,
        index: usize,
    },
}

impl ConsolidationError {
    /// True for errors caused by input records rather than configuration
    pub fn is_data_integrity(&self) -> bool {
        !matches!(self, ConsolidationError::InvalidConfig(_))
    }
}
