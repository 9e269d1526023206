//! Recognition layer
//!
//! Every backend implements [`Recognizer`] and answers one question per
//! segment: which track is playing, if any. Backends never see each other
//! and never touch consolidation; they only produce [`RawDetection`]s via
//! the [`runner`].
//!
//! Failure classification drives the retry decorator in [`retry`]:
//! transient and timeout errors are retried, fatal and config errors are not.
//! A segment whose recognition ultimately fails is recorded as unrecognized.

pub mod acoustid;
pub mod executable;
pub mod factory;
pub mod retry;
pub mod runner;
pub mod shazam;

pub use factory::{available_recognizers, build_recognizer, RecognizerParams};
pub use retry::{retry_with_backoff, Backoff, RetryPolicy, Retrying};
pub use runner::RecognitionRunner;

use crate::models::{RawDetection, Segment};
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Answer for one segment
#[derive(Debug, Clone, PartialEq)]
pub enum Recognition {
    Match {
        title: String,
        artist: String,
        confidence: Option<f32>,
    },
    NoMatch,
}

impl Recognition {
    /// Attach segment bounds and the backend identifier
    pub fn into_detection(self, source: &str, segment: &Segment) -> RawDetection {
        match self {
            Recognition::Match {
                title,
                artist,
                confidence,
            } => {
                let detection =
                    RawDetection::matched(source, segment.start, segment.end, title, artist);
                match confidence {
                    Some(c) => detection.with_confidence(c),
                    None => detection,
                }
            }
            Recognition::NoMatch => RawDetection::unrecognized(source, segment.start, segment.end),
        }
    }
}

/// Recognition failures
#[derive(Debug, Error)]
pub enum RecognitionError {
    /// Network hiccup, rate limit, 5xx
    #[error("Transient recognition failure: {0}")]
    Transient(String),

    #[error("Recognition timed out after {0:?}")]
    Timeout(Duration),

    /// Bad credentials, unparseable output, missing segment file
    #[error("Recognition failed: {0}")]
    Fatal(String),

    /// Backend cannot be constructed
    #[error("Recognizer configuration error: {0}")]
    Config(String),
}

impl RecognitionError {
    /// True when another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecognitionError::Transient(_) | RecognitionError::Timeout(_)
        )
    }
}

impl From<reqwest::Error> for RecognitionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RecognitionError::Timeout(Duration::ZERO)
        } else if err.is_decode() {
            RecognitionError::Fatal(format!("Malformed response: {}", err))
        } else {
            RecognitionError::Transient(err.to_string())
        }
    }
}

/// A recognition backend
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Stable backend identifier, used as `RawDetection::source`
    fn name(&self) -> &str;

    /// Identify the track playing in `segment`
    async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn segment() -> Segment {
        Segment {
            index: 2,
            start: 60.0,
            end: 90.0,
            path: PathBuf::from("/tmp/segment_0002.wav"),
        }
    }

    #[test]
    fn test_match_into_detection() {
        let detection = Recognition::Match {
            title: "Strobe".to_string(),
            artist: "deadmau5".to_string(),
            confidence: Some(0.92),
        }
        .into_detection("acoustid", &segment());

        assert!(detection.recognized);
        assert_eq!(detection.segment_start, 60.0);
        assert_eq!(detection.segment_end, 90.0);
        assert_eq!(detection.source, "acoustid");
        assert_eq!(detection.confidence, Some(0.92));
    }

    #[test]
    fn test_no_match_into_detection() {
        let detection = Recognition::NoMatch.into_detection("executable", &segment());
        assert!(!detection.recognized);
        assert!(detection.title.is_empty());
    }

    #[test]
    fn test_retry_classification() {
        assert!(RecognitionError::Transient("503".into()).is_retryable());
        assert!(RecognitionError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!RecognitionError::Fatal("bad key".into()).is_retryable());
        assert!(!RecognitionError::Config("missing".into()).is_retryable());
    }
}
