//! Runtime settings for djtl-id
//!
//! Built once from the TOML file model (plus CLI overrides applied by the
//! binary) and validated eagerly, before any download or recognition work.

use crate::consolidation::ConsolidationConfig;
use crate::recognition::factory::canonical_name;
use crate::recognition::retry::MAX_RETRY_DELAY_SECS;
use crate::recognition::{RecognitionRunner, RecognizerParams, RetryPolicy};
use djtl_common::config::{resolve_acoustid_api_key, ServerSection, TomlConfig};
use djtl_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_OUTPUT_DIR: &str = "output";

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub consolidation: ConsolidationConfig,
    /// Segment length in seconds
    pub chunk_duration: f64,
    pub max_concurrency: usize,
    pub segment_timeout: Duration,
    pub retry: RetryPolicy,
    /// Backends to run, in request order
    pub recognizers: Vec<String>,
    pub acoustid_api_key: Option<String>,
    pub executable_path: Option<PathBuf>,
    pub fpcalc_path: PathBuf,
    pub songrec_path: PathBuf,
    pub enrich: bool,
    pub output_dir: PathBuf,
    pub server: ServerSection,
}

impl Settings {
    /// Build from the TOML model and validate
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let recognition = &config.recognition;

        if !recognition.initial_delay_secs.is_finite()
            || !recognition.max_delay_secs.is_finite()
            || recognition.initial_delay_secs < 0.0
            || recognition.max_delay_secs < recognition.initial_delay_secs
            || recognition.max_delay_secs > MAX_RETRY_DELAY_SECS
        {
            return Err(Error::Config(format!(
                "retry delays must satisfy 0 <= initial_delay_secs ({}) <= max_delay_secs ({}) <= {}",
                recognition.initial_delay_secs, recognition.max_delay_secs, MAX_RETRY_DELAY_SECS
            )));
        }
        if !(0.0..=1.0).contains(&recognition.jitter) {
            return Err(Error::Config(format!(
                "jitter must be within [0, 1], got {}",
                recognition.jitter
            )));
        }

        let consolidation = ConsolidationConfig::from_section(&config.consolidation)
            .map_err(|e| Error::Config(e.to_string()))?;

        let settings = Self {
            consolidation,
            chunk_duration: recognition.chunk_duration_secs,
            max_concurrency: recognition.max_concurrency,
            segment_timeout: Duration::from_secs(recognition.segment_timeout_secs),
            retry: RetryPolicy::from_section(recognition),
            recognizers: recognition.recognizers.clone(),
            acoustid_api_key: resolve_acoustid_api_key(config),
            executable_path: recognition.executable_path.clone(),
            fpcalc_path: recognition.fpcalc_path.clone(),
            songrec_path: recognition.songrec_path.clone(),
            enrich: config.enrichment.enabled,
            output_dir: config
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            server: config.server.clone(),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Re-check after overrides
    pub fn validate(&self) -> Result<()> {
        self.consolidation
            .validate()
            .map_err(|e| Error::Config(e.to_string()))?;

        if !self.chunk_duration.is_finite() || self.chunk_duration <= 0.0 {
            return Err(Error::Config(format!(
                "chunk_duration must be positive, got {}",
                self.chunk_duration
            )));
        }
        if self.max_concurrency == 0 {
            return Err(Error::Config("max_concurrency must be at least 1".to_string()));
        }
        if self.segment_timeout.is_zero() {
            return Err(Error::Config("segment_timeout must be positive".to_string()));
        }
        if self.recognizers.is_empty() {
            return Err(Error::Config("at least one recognizer is required".to_string()));
        }
        for name in &self.recognizers {
            if canonical_name(name).is_none() {
                return Err(Error::Config(format!("unknown recognizer '{}'", name)));
            }
        }

        Ok(())
    }

    pub fn recognizer_params(&self) -> RecognizerParams {
        RecognizerParams {
            acoustid_api_key: self.acoustid_api_key.clone(),
            fpcalc_path: self.fpcalc_path.clone(),
            songrec_path: self.songrec_path.clone(),
            executable_path: self.executable_path.clone(),
            retry: self.retry,
        }
    }

    pub fn runner(&self) -> RecognitionRunner {
        RecognitionRunner::new(self.max_concurrency, self.segment_timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_defaults_are_valid() {
        let settings = Settings::from_toml(&TomlConfig::default()).unwrap();
        assert_eq!(settings.chunk_duration, 30.0);
        assert_eq!(settings.max_concurrency, 3);
        assert_eq!(settings.segment_timeout, Duration::from_secs(60));
        assert_eq!(settings.recognizers, vec!["acoustid".to_string()]);
        assert_eq!(settings.output_dir, PathBuf::from("output"));
        assert_eq!(settings.retry.max_retries, 5);
    }

    #[test]
    #[serial]
    fn test_zero_concurrency_rejected() {
        let mut config = TomlConfig::default();
        config.recognition.max_concurrency = 0;
        assert!(matches!(Settings::from_toml(&config), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_bad_consolidation_rejected() {
        let mut config = TomlConfig::default();
        config.consolidation.similarity_threshold = 2.0;
        assert!(Settings::from_toml(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_unknown_recognizer_rejected() {
        let mut config = TomlConfig::default();
        config.recognition.recognizers = vec!["gracenote".to_string()];
        assert!(Settings::from_toml(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_inverted_delays_rejected() {
        let mut config = TomlConfig::default();
        config.recognition.initial_delay_secs = 10.0;
        config.recognition.max_delay_secs = 1.0;
        assert!(Settings::from_toml(&config).is_err());
    }

    #[test]
    #[serial]
    fn test_huge_max_delay_rejected() {
        let mut config = TomlConfig::default();
        config.recognition.max_delay_secs = 1e20;
        assert!(matches!(Settings::from_toml(&config), Err(Error::Config(_))));
    }

    #[test]
    #[serial]
    fn test_override_then_validate() {
        let mut settings = Settings::from_toml(&TomlConfig::default()).unwrap();
        settings.chunk_duration = 0.0;
        assert!(settings.validate().is_err());
    }
}
