//! Title/artist similarity scoring
//!
//! Both fields are normalized (case folded, diacritics stripped, punctuation
//! removed, whitespace collapsed) and compared with a per-field metric. The
//! field scores are combined with the configured weights:
//!
//! ```text
//! score = w_title · sim(title_a, title_b) + w_artist · sim(artist_a, artist_b)
//! ```
//!
//! A field that normalizes to the empty string on either side scores 0.

use super::config::{SimilarityMetric, SimilarityWeights};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Weighted two-field scorer
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    weights: SimilarityWeights,
    metric: SimilarityMetric,
}

impl SimilarityScorer {
    pub fn new(weights: SimilarityWeights, metric: SimilarityMetric) -> Self {
        Self { weights, metric }
    }

    /// Combined score in [0, 1]
    pub fn score(&self, title_a: &str, artist_a: &str, title_b: &str, artist_b: &str) -> f64 {
        let title = self.field_similarity(title_a, title_b);
        let artist = self.field_similarity(artist_a, artist_b);
        (self.weights.title * title + self.weights.artist * artist).clamp(0.0, 1.0)
    }

    /// Similarity of one normalized field
    pub fn field_similarity(&self, a: &str, b: &str) -> f64 {
        let a = normalize(a);
        let b = normalize(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        match self.metric {
            SimilarityMetric::SequenceRatio => sequence_ratio(&a, &b),
            SimilarityMetric::Levenshtein => strsim::normalized_levenshtein(&a, &b),
        }
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(SimilarityWeights::default(), SimilarityMetric::default())
    }
}

/// Canonical comparison form of a title or artist
///
/// Apostrophes are dropped so "Don't" and "Dont" compare equal; any other
/// non-alphanumeric character becomes a word break.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        if matches!(c, '\'' | '\u{2019}' | '`') {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }

    out
}

/// Ratcliff/Obershelp ratio `2·M / T`
///
/// `M` is the total length of matching blocks found by recursively taking
/// the longest common substring and recursing on both sides. `T` is the
/// combined length. Block selection depends on argument order, so the
/// larger of both orders is reported to keep the ratio symmetric.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matches = matching_chars(&a, &b).max(matching_chars(&b, &a));
    2.0 * matches as f64 / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        total += k;
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }

    total
}

/// Longest common block in `a[alo..ahi]` and `b[blo..bhi]`
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let width = bhi - blo;
    let mut best = (alo, blo, 0);
    let mut previous = vec![0usize; width + 1];
    let mut current = vec![0usize; width + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            let slot = j - blo + 1;
            if a[i] == b[j] {
                let len = previous[slot - 1] + 1;
                current[slot] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            } else {
                current[slot] = 0;
            }
        }
        std::mem::swap(&mut previous, &mut current);
    }

    best
}
