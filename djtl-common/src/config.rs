//! Configuration file model and resolution
//!
//! The TOML file is the bootstrap layer only. Values are raw here; the
//! service crate validates them into typed, immutable configuration values
//! before any work starts.
//!
//! Config file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`DJTL_CONFIG`)
//! 3. `<config_dir>/djtl/config.toml` if it exists
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DJTL_CONFIG";

/// Environment variable carrying the AcoustID client key
pub const ACOUSTID_KEY_ENV_VAR: &str = "DJTL_ACOUSTID_API_KEY";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Consolidation engine parameters
    #[serde(default)]
    pub consolidation: ConsolidationSection,

    /// Segment recognition parameters
    #[serde(default)]
    pub recognition: RecognitionSection,

    /// Metadata enrichment switch
    #[serde(default)]
    pub enrichment: EnrichmentSection,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerSection,

    /// Directory for exported tracklists and session reports
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[consolidation]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationSection {
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_max_interruptions")]
    pub max_interruptions: u32,
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: f64,
    #[serde(default = "default_title_weight")]
    pub title_weight: f64,
    #[serde(default = "default_artist_weight")]
    pub artist_weight: f64,
    /// Backend names in tie-break order for multi-source merge
    #[serde(default)]
    pub source_priority: Vec<String>,
    /// "first_seen" or "majority"
    #[serde(default = "default_representative")]
    pub representative: String,
    /// "sequence_ratio" or "levenshtein"
    #[serde(default = "default_metric")]
    pub metric: String,
}

impl Default for ConsolidationSection {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            max_interruptions: default_max_interruptions(),
            min_duration_secs: default_min_duration_secs(),
            title_weight: default_title_weight(),
            artist_weight: default_artist_weight(),
            source_priority: Vec::new(),
            representative: default_representative(),
            metric: default_metric(),
        }
    }
}

/// `[recognition]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionSection {
    #[serde(default = "default_chunk_duration_secs")]
    pub chunk_duration_secs: f64,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default = "default_segment_timeout_secs")]
    pub segment_timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: f64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: f64,
    /// Jitter as a fraction of the computed delay (0.2 = ±20%)
    #[serde(default = "default_jitter")]
    pub jitter: f64,
    /// Backends used when a request does not name any
    #[serde(default = "default_recognizers")]
    pub recognizers: Vec<String>,
    #[serde(default)]
    pub acoustid_api_key: Option<String>,
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
    #[serde(default = "default_fpcalc_path")]
    pub fpcalc_path: PathBuf,
    /// SongRec CLI used by the Shazam backend
    #[serde(default = "default_songrec_path")]
    pub songrec_path: PathBuf,
}

impl Default for RecognitionSection {
    fn default() -> Self {
        Self {
            chunk_duration_secs: default_chunk_duration_secs(),
            max_concurrency: default_max_concurrency(),
            segment_timeout_secs: default_segment_timeout_secs(),
            max_retries: default_max_retries(),
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            jitter: default_jitter(),
            recognizers: default_recognizers(),
            acoustid_api_key: None,
            executable_path: None,
            fpcalc_path: default_fpcalc_path(),
            songrec_path: default_songrec_path(),
        }
    }
}

/// `[enrichment]` table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnrichmentSection {
    #[serde(default)]
    pub enabled: bool,
}

/// `[server]` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_similarity_threshold() -> f64 {
    0.85
}
fn default_max_interruptions() -> u32 {
    1
}
fn default_min_duration_secs() -> f64 {
    60.0
}
fn default_title_weight() -> f64 {
    0.7
}
fn default_artist_weight() -> f64 {
    0.3
}
fn default_representative() -> String {
    "first_seen".to_string()
}
fn default_metric() -> String {
    "sequence_ratio".to_string()
}
fn default_chunk_duration_secs() -> f64 {
    30.0
}
fn default_max_concurrency() -> usize {
    3
}
fn default_segment_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    5
}
fn default_initial_delay_secs() -> f64 {
    1.0
}
fn default_max_delay_secs() -> f64 {
    60.0
}
fn default_jitter() -> f64 {
    0.2
}
fn default_recognizers() -> Vec<String> {
    vec!["acoustid".to_string()]
}
fn default_fpcalc_path() -> PathBuf {
    PathBuf::from("fpcalc")
}
fn default_songrec_path() -> PathBuf {
    PathBuf::from("songrec")
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    5730
}
fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Resolve which config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Platform config directory
    default_config_path().filter(|p| p.exists())
}

/// `<config_dir>/djtl/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("djtl").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the resolved config file, falling back to built-in defaults
///
/// An explicitly requested file (CLI or environment) must exist and parse.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(cli_arg) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Configuration loaded from {}", path.display());
            Ok(config)
        }
        None => {
            debug!("No configuration file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Resolve the AcoustID client key
///
/// **Priority:** ENV → TOML
pub fn resolve_acoustid_api_key(config: &TomlConfig) -> Option<String> {
    let env_key = std::env::var(ACOUSTID_KEY_ENV_VAR)
        .ok()
        .filter(|k| is_valid_key(k));
    let toml_key = config
        .recognition
        .acoustid_api_key
        .clone()
        .filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!("AcoustID API key found in environment and TOML. Using environment (highest priority).");
    }

    env_key.or(toml_key)
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
