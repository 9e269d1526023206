//! Consolidation engine
//!
//! Turns per-segment recognition records into a tracklist:
//!
//! ```text
//! records ─▶ validate ─▶ Consolidator ─▶ duration filter ─┐
//! records ─▶ validate ─▶ Consolidator ─▶ duration filter ─┼─▶ merge ─▶ tracks
//! ```
//!
//! Everything here is synchronous and deterministic; the configuration is
//! an immutable value fixed when the pipeline is built.

pub mod config;
pub mod consolidator;
pub mod duration_filter;
pub mod error;
pub mod merger;
pub mod similarity;
pub mod validation;

pub use config::{ConsolidationConfig, RepresentativePolicy, SimilarityMetric, SimilarityWeights};
pub use consolidator::Consolidator;
pub use duration_filter::filter_by_duration;
pub use error::ConsolidationError;
pub use merger::{merge_sources, COMBINED_SOURCE};
pub use similarity::SimilarityScorer;
pub use validation::validate_records;

use crate::models::{ConsolidatedTrack, RawDetection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One backend's time-ordered records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendRecords {
    pub source: String,
    pub records: Vec<RawDetection>,
}

impl BackendRecords {
    pub fn new(source: impl Into<String>, records: Vec<RawDetection>) -> Self {
        Self {
            source: source.into(),
            records,
        }
    }

    /// Split a flat record list by `source`, keeping first-appearance order
    /// of backends and the original order of records within each
    pub fn group(records: Vec<RawDetection>) -> Vec<BackendRecords> {
        let mut groups: Vec<BackendRecords> = Vec::new();
        for record in records {
            match groups.iter_mut().find(|g| g.source == record.source) {
                Some(group) => group.records.push(record),
                None => groups.push(BackendRecords::new(record.source.clone(), vec![record])),
            }
        }
        groups
    }
}

/// Validated consolidation pipeline
#[derive(Debug, Clone)]
pub struct ConsolidationPipeline {
    config: ConsolidationConfig,
    consolidator: Consolidator,
}

impl ConsolidationPipeline {
    /// Fails on an invalid config before any records are seen
    pub fn new(config: ConsolidationConfig) -> Result<Self, ConsolidationError> {
        config.validate()?;
        let consolidator = Consolidator::new(&config);
        Ok(Self {
            config,
            consolidator,
        })
    }

    pub fn config(&self) -> &ConsolidationConfig {
        &self.config
    }

    /// Validate, fold and filter one backend's records
    pub fn consolidate_backend(
        &self,
        backend: &BackendRecords,
    ) -> Result<Vec<ConsolidatedTrack>, ConsolidationError> {
        validate_records(&backend.source, &backend.records)?;

        let folded = self.consolidator.consolidate(&backend.records);
        let folded_count = folded.len();
        let tracks = filter_by_duration(folded, self.config.min_duration);

        debug!(
            source = %backend.source,
            records = backend.records.len(),
            groups = folded_count,
            kept = tracks.len(),
            "Consolidated backend"
        );

        Ok(tracks)
    }

    /// Combine already-consolidated per-backend lists
    pub fn merge(&self, lists: Vec<Vec<ConsolidatedTrack>>) -> Vec<ConsolidatedTrack> {
        merge_sources(lists, &self.config.source_priority)
    }

    /// Full run: every backend is consolidated, then merged when more than one
    /// is present. The first data-integrity violation aborts the run.
    pub fn run(&self, backends: &[BackendRecords]) -> Result<Vec<ConsolidatedTrack>, ConsolidationError> {
        let mut lists = Vec::with_capacity(backends.len());
        for backend in backends {
            lists.push(self.consolidate_backend(backend)?);
        }

        let tracks = if lists.len() > 1 {
            self.merge(lists)
        } else {
            lists.pop().unwrap_or_default()
        };

        info!(backends = backends.len(), tracks = tracks.len(), "Consolidation complete");
        Ok(tracks)
    }
}

/// Build a pipeline for `config` and run it over `backends`
pub fn run_pipeline(
    backends: &[BackendRecords],
    config: &ConsolidationConfig,
) -> Result<Vec<ConsolidatedTrack>, ConsolidationError> {
    ConsolidationPipeline::new(config.clone())?.run(backends)
}
