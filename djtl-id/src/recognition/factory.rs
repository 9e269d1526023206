//! Recognizer construction by name

use super::acoustid::{self, AcoustIdRecognizer};
use super::executable::{self, ExecutableRecognizer};
use super::shazam::{self, ShazamRecognizer};
use super::{RecognitionError, Recognizer, RetryPolicy, Retrying};
use std::path::PathBuf;
use std::sync::Arc;

/// Names accepted by [`build_recognizer`]; `track_finder` aliases `executable`
const RECOGNIZER_NAMES: &[&str] = &[
    shazam::BACKEND_NAME,
    acoustid::BACKEND_NAME,
    executable::BACKEND_NAME,
    "track_finder",
];

/// Everything a backend may need to start
#[derive(Debug, Clone, Default)]
pub struct RecognizerParams {
    pub acoustid_api_key: Option<String>,
    pub fpcalc_path: PathBuf,
    pub songrec_path: PathBuf,
    pub executable_path: Option<PathBuf>,
    pub retry: RetryPolicy,
}

pub fn available_recognizers() -> Vec<&'static str> {
    RECOGNIZER_NAMES.to_vec()
}

/// Canonical backend identifier for a requested name
pub fn canonical_name(name: &str) -> Option<&'static str> {
    match name.trim().to_ascii_lowercase().as_str() {
        "shazam" => Some(shazam::BACKEND_NAME),
        "acoustid" => Some(acoustid::BACKEND_NAME),
        "executable" | "track_finder" => Some(executable::BACKEND_NAME),
        _ => None,
    }
}

/// Build a retry-wrapped backend by name
pub fn build_recognizer(
    name: &str,
    params: &RecognizerParams,
) -> Result<Arc<dyn Recognizer>, RecognitionError> {
    let canonical = canonical_name(name).ok_or_else(|| {
        RecognitionError::Config(format!(
            "Unknown recognizer '{}' (available: {})",
            name,
            RECOGNIZER_NAMES.join(", ")
        ))
    })?;

    tracing::debug!(requested = name, backend = canonical, "Building recognizer");

    let recognizer: Arc<dyn Recognizer> = match canonical {
        shazam::BACKEND_NAME => {
            let inner = ShazamRecognizer::new(params.songrec_path.clone())?;
            Arc::new(Retrying::new(inner, params.retry))
        }
        acoustid::BACKEND_NAME => {
            let key = params.acoustid_api_key.clone().ok_or_else(|| {
                RecognitionError::Config("AcoustID API key is not configured".to_string())
            })?;
            let inner = AcoustIdRecognizer::new(key, params.fpcalc_path.clone())?;
            Arc::new(Retrying::new(inner, params.retry))
        }
        _ => {
            let path = params.executable_path.clone().ok_or_else(|| {
                RecognitionError::Config("executable_path is not configured".to_string())
            })?;
            let inner = ExecutableRecognizer::new(path)?;
            Arc::new(Retrying::new(inner, params.retry))
        }
    };

    Ok(recognizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_resolves() {
        assert_eq!(canonical_name("track_finder"), Some("executable"));
        assert_eq!(canonical_name(" AcoustID "), Some("acoustid"));
        assert_eq!(canonical_name("Shazam"), Some("shazam"));
        assert_eq!(canonical_name("gracenote"), None);
    }

    #[test]
    fn test_unknown_name_is_error() {
        let err = build_recognizer("gracenote", &RecognizerParams::default()).err();
        assert!(matches!(err, Some(RecognitionError::Config(msg)) if msg.contains("gracenote")));
    }

    #[test]
    fn test_acoustid_requires_key() {
        let err = build_recognizer("acoustid", &RecognizerParams::default()).err();
        assert!(matches!(err, Some(RecognitionError::Config(_))));
    }

    #[test]
    fn test_acoustid_builds_with_key() {
        let params = RecognizerParams {
            acoustid_api_key: Some("abcdef".to_string()),
            fpcalc_path: PathBuf::from("fpcalc"),
            ..RecognizerParams::default()
        };
        let recognizer = build_recognizer("acoustid", &params).unwrap();
        assert_eq!(recognizer.name(), "acoustid");
    }

    #[test]
    fn test_shazam_builds_and_requires_songrec_path() {
        let err = build_recognizer("shazam", &RecognizerParams::default()).err();
        assert!(matches!(err, Some(RecognitionError::Config(_))));

        let params = RecognizerParams {
            songrec_path: PathBuf::from("songrec"),
            ..RecognizerParams::default()
        };
        let recognizer = build_recognizer("shazam", &params).unwrap();
        assert_eq!(recognizer.name(), "shazam");
    }

    #[test]
    fn test_listing_includes_alias() {
        assert!(available_recognizers().contains(&"track_finder"));
    }
}
