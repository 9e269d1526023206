//! Single-pass fold from raw detections to consolidated tracks
//!
//! At most one group is open at a time. Per record:
//!
//! 1. Unrecognized: bump the open group's interruption counter and close the
//!    group once the counter exceeds `max_interruptions`. Never opens a group.
//! 2. Recognized, nothing open: open a group seeded from the record.
//! 3. Recognized, group open: score against the group's seed text. At or
//!    above the threshold the group is extended and the counter reset;
//!    below it the group is closed and a new one opened.
//!
//! Whatever is still open at end of stream is emitted.
//!
//! Input must already be in time order (see [`super::validation`]).

use super::config::{ConsolidationConfig, RepresentativePolicy};
use super::similarity::SimilarityScorer;
use crate::models::{ConsolidatedTrack, RawDetection};
use tracing::trace;

/// In-progress run of records believed to be the same track
#[derive(Debug, Clone)]
struct OpenGroup {
    seed_title: String,
    seed_artist: String,
    start: f64,
    end: f64,
    source: String,
    contributing: usize,
    interruptions: u32,
    confidence: Option<f32>,
    /// Exact (title, artist) spellings with their counts, in first-seen order
    variants: Vec<(String, String, usize)>,
}

impl OpenGroup {
    fn seed(record: &RawDetection) -> Self {
        Self {
            seed_title: record.title.clone(),
            seed_artist: record.artist.clone(),
            start: record.segment_start,
            end: record.segment_end,
            source: record.source.clone(),
            contributing: 1,
            interruptions: 0,
            confidence: record.confidence,
            variants: vec![(record.title.clone(), record.artist.clone(), 1)],
        }
    }

    fn extend(&mut self, record: &RawDetection) {
        self.end = record.segment_end;
        self.contributing += 1;
        self.interruptions = 0;
        self.confidence = match (self.confidence, record.confidence) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        match self
            .variants
            .iter_mut()
            .find(|(title, artist, _)| *title == record.title && *artist == record.artist)
        {
            Some((_, _, count)) => *count += 1,
            None => self
                .variants
                .push((record.title.clone(), record.artist.clone(), 1)),
        }
    }

    fn close(self, policy: RepresentativePolicy) -> ConsolidatedTrack {
        let (title, artist) = match policy {
            RepresentativePolicy::FirstSeen => (self.seed_title, self.seed_artist),
            RepresentativePolicy::Majority => {
                // Strict `>` keeps the earliest variant on ties
                let mut best: Option<&(String, String, usize)> = None;
                for variant in &self.variants {
                    if best.map_or(true, |b| variant.2 > b.2) {
                        best = Some(variant);
                    }
                }
                match best {
                    Some((title, artist, _)) => (title.clone(), artist.clone()),
                    None => (self.seed_title, self.seed_artist),
                }
            }
        };

        ConsolidatedTrack {
            title,
            artist,
            start: self.start,
            end: self.end,
            contributing_count: self.contributing,
            source: self.source,
            corroborated_by: Vec::new(),
            confidence: self.confidence,
        }
    }
}

/// Folds one backend's ordered detections into tracks
#[derive(Debug, Clone)]
pub struct Consolidator {
    scorer: SimilarityScorer,
    threshold: f64,
    max_interruptions: u32,
    policy: RepresentativePolicy,
}

impl Consolidator {
    pub fn new(config: &ConsolidationConfig) -> Self {
        Self {
            scorer: SimilarityScorer::new(config.weights, config.metric),
            threshold: config.similarity_threshold,
            max_interruptions: config.max_interruptions,
            policy: config.representative,
        }
    }

    /// Run the fold. Empty input yields an empty list.
    pub fn consolidate(&self, records: &[RawDetection]) -> Vec<ConsolidatedTrack> {
        let mut tracks = Vec::new();
        let mut open: Option<OpenGroup> = None;

        for record in records {
            if !record.recognized {
                let exceeded = match open.as_mut() {
                    Some(group) => {
                        group.interruptions += 1;
                        group.interruptions > self.max_interruptions
                    }
                    None => false,
                };
                if exceeded {
                    trace!(
                        at = record.segment_start,
                        "Interruption limit exceeded, closing group"
                    );
                    if let Some(group) = open.take() {
                        tracks.push(group.close(self.policy));
                    }
                }
                continue;
            }

            match open.as_mut() {
                None => open = Some(OpenGroup::seed(record)),
                Some(group) => {
                    let score = self.scorer.score(
                        &group.seed_title,
                        &group.seed_artist,
                        &record.title,
                        &record.artist,
                    );
                    if score >= self.threshold {
                        group.extend(record);
                    } else {
                        trace!(
                            at = record.segment_start,
                            score,
                            "Dissimilar record, starting new group"
                        );
                        let closed = std::mem::replace(group, OpenGroup::seed(record));
                        tracks.push(closed.close(self.policy));
                    }
                }
            }
        }

        if let Some(group) = open {
            tracks.push(group.close(self.policy));
        }

        tracks
    }
}
