//! External-executable recognizer
//!
//! Runs a local identification tool once per segment:
//!
//! ```text
//! <executable> --search <segment.wav> --json
//! ```
//!
//! and reads a JSON verdict from stdout:
//!
//! ```json
//! {"success": true, "matched": true,
//!  "audio": {"title": "...", "artist": "...", "confidence": 87.5}}
//! ```

use super::{Recognition, RecognitionError, Recognizer};
use crate::models::Segment;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;

pub const BACKEND_NAME: &str = "executable";

#[derive(Debug, Deserialize)]
pub struct ToolOutput {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub matched: bool,
    pub audio: Option<ToolAudio>,
}

#[derive(Debug, Deserialize)]
pub struct ToolAudio {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub confidence: Option<f64>,
}

pub struct ExecutableRecognizer {
    executable: PathBuf,
}

impl ExecutableRecognizer {
    /// Fails when the executable does not exist
    pub fn new(executable: PathBuf) -> Result<Self, RecognitionError> {
        if !executable.is_file() {
            return Err(RecognitionError::Config(format!(
                "Recognizer executable not found: {}",
                executable.display()
            )));
        }
        tracing::info!(path = %executable.display(), "Using external recognizer executable");
        Ok(Self { executable })
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

/// Reduce the tool's verdict to a recognition
///
/// A verdict needs `success`, `matched` and an `audio` block carrying title,
/// artist and confidence; anything less counts as no match. Confidence above
/// 1 is read as a percentage.
pub fn interpret_output(output: ToolOutput) -> Recognition {
    if !output.success || !output.matched {
        return Recognition::NoMatch;
    }

    let Some(ToolAudio {
        title: Some(title),
        artist: Some(artist),
        confidence: Some(confidence),
    }) = output.audio
    else {
        return Recognition::NoMatch;
    };

    if title.trim().is_empty() {
        return Recognition::NoMatch;
    }

    let confidence = if confidence > 1.0 {
        confidence / 100.0
    } else {
        confidence
    };

    Recognition::Match {
        title,
        artist,
        confidence: Some(confidence.clamp(0.0, 1.0) as f32),
    }
}

#[async_trait]
impl Recognizer for ExecutableRecognizer {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn recognize(&self, segment: &Segment) -> Result<Recognition, RecognitionError> {
        tracing::debug!(
            executable = %self.executable.display(),
            segment = %segment.path.display(),
            "Running external recognizer"
        );

        let output = Command::new(&self.executable)
            .arg("--search")
            .arg(&segment.path)
            .arg("--json")
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| RecognitionError::Fatal(format!("Failed to spawn recognizer: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Fatal(format!(
                "Recognizer exited with {:?}: {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let parsed: ToolOutput = serde_json::from_slice(&output.stdout).map_err(|e| {
            RecognitionError::Fatal(format!("Recognizer output is not valid JSON: {}", e))
        })?;

        Ok(interpret_output(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ToolOutput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_full_match() {
        let output = parse(
            r#"{"success":true,"matched":true,"audio":{"title":"Pjanoo","artist":"Eric Prydz","confidence":0.8,"trackId":"x"}}"#,
        );
        assert_eq!(
            interpret_output(output),
            Recognition::Match {
                title: "Pjanoo".to_string(),
                artist: "Eric Prydz".to_string(),
                confidence: Some(0.8),
            }
        );
    }

    #[test]
    fn test_percentage_confidence_scaled() {
        let output = parse(
            r#"{"success":true,"matched":true,"audio":{"title":"Pjanoo","artist":"Eric Prydz","confidence":87.5}}"#,
        );
        match interpret_output(output) {
            Recognition::Match { confidence, .. } => assert_eq!(confidence, Some(0.875)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_or_incomplete_is_no_match() {
        for json in [
            r#"{"success":true,"matched":false}"#,
            r#"{"success":false,"matched":true,"audio":{"title":"a","artist":"b","confidence":1}}"#,
            r#"{"success":true,"matched":true,"audio":{"title":"a","artist":"b"}}"#,
            r#"{"success":true,"matched":true}"#,
        ] {
            assert_eq!(interpret_output(parse(json)), Recognition::NoMatch, "{json}");
        }
    }

    #[test]
    fn test_missing_executable_rejected() {
        let err = ExecutableRecognizer::new(PathBuf::from("/nonexistent/track_finder")).err();
        assert!(matches!(err, Some(RecognitionError::Config(_))));
    }
}
