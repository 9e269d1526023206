//! Multi-source merge
//!
//! Every backend's consolidated list is placed on one timeline and swept
//! left to right. An incoming track that overlaps the last emitted track is
//! a duplicate view of the same audio: the one backed by more segments wins
//! and absorbs the other's source as corroboration.
//!
//! When more than one list is merged, a track that no other backend
//! overlapped is tagged with [`COMBINED_SOURCE`]. Corroborated tracks keep
//! the winning backend's identifier.

use crate::models::ConsolidatedTrack;
use std::cmp::Ordering;
use tracing::debug;

/// Source of a sole-contributor track in a multi-backend merge
pub const COMBINED_SOURCE: &str = "combined";

/// Rank in the priority list; unlisted sources sort after listed ones
fn priority_rank(priority: &[String], source: &str) -> usize {
    priority
        .iter()
        .position(|s| s == source)
        .unwrap_or(priority.len())
}

fn compare_priority(priority: &[String], a: &str, b: &str) -> Ordering {
    priority_rank(priority, a)
        .cmp(&priority_rank(priority, b))
        .then_with(|| a.cmp(b))
}

/// True when `candidate` should represent the region instead of `current`
fn outranks(priority: &[String], candidate: &ConsolidatedTrack, current: &ConsolidatedTrack) -> bool {
    match candidate.contributing_count.cmp(&current.contributing_count) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            compare_priority(priority, &candidate.source, &current.source) == Ordering::Less
        }
    }
}

fn absorb(winner: &mut ConsolidatedTrack, loser: ConsolidatedTrack) {
    let sources = std::iter::once(loser.source).chain(loser.corroborated_by);
    for source in sources {
        if source != winner.source && !winner.corroborated_by.contains(&source) {
            winner.corroborated_by.push(source);
        }
    }
}

/// Combine per-backend track lists into one start-ordered list
pub fn merge_sources(
    lists: Vec<Vec<ConsolidatedTrack>>,
    source_priority: &[String],
) -> Vec<ConsolidatedTrack> {
    let multi_source = lists.len() > 1;
    let mut all: Vec<ConsolidatedTrack> = lists.into_iter().flatten().collect();
    all.sort_by(|a, b| {
        a.start
            .total_cmp(&b.start)
            .then_with(|| compare_priority(source_priority, &a.source, &b.source))
    });

    let mut merged: Vec<ConsolidatedTrack> = Vec::with_capacity(all.len());
    for incoming in all {
        match merged.last_mut() {
            Some(last) if last.overlaps(&incoming) => {
                debug!(
                    kept_title = %last.title,
                    other_title = %incoming.title,
                    other_source = %incoming.source,
                    "Overlapping tracks from different backends"
                );

                if outranks(source_priority, &incoming, last) {
                    let loser = std::mem::replace(last, incoming);
                    absorb(last, loser);
                } else {
                    absorb(last, incoming);
                }
            }
            _ => merged.push(incoming),
        }
    }

    if multi_source {
        for track in merged.iter_mut().filter(|t| t.corroborated_by.is_empty()) {
            track.source = COMBINED_SOURCE.to_string();
        }
    }

    merged
}
