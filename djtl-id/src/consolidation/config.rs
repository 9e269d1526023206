//! Consolidation parameters
//!
//! An immutable value passed into the pipeline. Validation happens once,
//! when the pipeline is built, so the fold itself never sees a bad config.

use super::error::ConsolidationError;
use djtl_common::config::ConsolidationSection;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Field weights for the similarity scorer (must sum to 1)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityWeights {
    pub title: f64,
    pub artist: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            title: 0.7,
            artist: 0.3,
        }
    }
}

/// Per-field string similarity metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Matching-blocks ratio `2·M / T`
    #[default]
    SequenceRatio,
    /// `strsim::normalized_levenshtein`
    Levenshtein,
}

impl FromStr for SimilarityMetric {
    type Err = ConsolidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence_ratio" | "ratio" => Ok(Self::SequenceRatio),
            "levenshtein" => Ok(Self::Levenshtein),
            other => Err(ConsolidationError::InvalidConfig(format!(
                "unknown similarity metric '{}'",
                other
            ))),
        }
    }
}

/// Which text a consolidated track reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePolicy {
    /// Text of the first contributing record
    #[default]
    FirstSeen,
    /// Most frequent exact (title, artist) variant, ties to the earliest
    Majority,
}

impl FromStr for RepresentativePolicy {
    type Err = ConsolidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first_seen" | "first" => Ok(Self::FirstSeen),
            "majority" => Ok(Self::Majority),
            other => Err(ConsolidationError::InvalidConfig(format!(
                "unknown representative policy '{}'",
                other
            ))),
        }
    }
}

/// Consolidation engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationConfig {
    /// Inclusive merge threshold in [0, 1]
    pub similarity_threshold: f64,
    /// Consecutive unrecognized records tolerated inside a group
    pub max_interruptions: u32,
    /// Tracks shorter than this (seconds) are discarded
    pub min_duration: f64,
    pub weights: SimilarityWeights,
    /// Backend tie-break order for multi-source merge
    pub source_priority: Vec<String>,
    pub representative: RepresentativePolicy,
    pub metric: SimilarityMetric,
}

impl Default for ConsolidationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            max_interruptions: 1,
            min_duration: 60.0,
            weights: SimilarityWeights::default(),
            source_priority: Vec::new(),
            representative: RepresentativePolicy::FirstSeen,
            metric: SimilarityMetric::SequenceRatio,
        }
    }
}

impl ConsolidationConfig {
    /// Build from the `[consolidation]` TOML table and validate
    pub fn from_section(section: &ConsolidationSection) -> Result<Self, ConsolidationError> {
        let config = Self {
            similarity_threshold: section.similarity_threshold,
            max_interruptions: section.max_interruptions,
            min_duration: section.min_duration_secs,
            weights: SimilarityWeights {
                title: section.title_weight,
                artist: section.artist_weight,
            },
            source_priority: section.source_priority.clone(),
            representative: section.representative.parse()?,
            metric: section.metric.parse()?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject out-of-range parameters
    pub fn validate(&self) -> Result<(), ConsolidationError> {
        let invalid = |msg: String| Err(ConsolidationError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return invalid(format!(
                "similarity_threshold must be within [0, 1], got {}",
                self.similarity_threshold
            ));
        }
        if !self.min_duration.is_finite() || self.min_duration <= 0.0 {
            return invalid(format!(
                "min_duration must be positive, got {}",
                self.min_duration
            ));
        }

        let SimilarityWeights { title, artist } = self.weights;
        if !title.is_finite() || !artist.is_finite() || title < 0.0 || artist < 0.0 {
            return invalid(format!(
                "weights must be non-negative, got title={} artist={}",
                title, artist
            ));
        }
        if ((title + artist) - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return invalid(format!(
                "title_weight + artist_weight must equal 1, got {}",
                title + artist
            ));
        }

        let mut seen = HashSet::new();
        for source in &self.source_priority {
            if !seen.insert(source.as_str()) {
                return invalid(format!("source_priority lists '{}' twice", source));
            }
        }

        Ok(())
    }
}
