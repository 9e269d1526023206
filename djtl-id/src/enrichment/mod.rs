//! Optional post-consolidation metadata enrichment
//!
//! Purely additive: a failed lookup leaves the track as it was.

pub mod musicbrainz;

pub use musicbrainz::MusicBrainzEnricher;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("MusicBrainz API error {0}")]
    Api(u16),

    #[error("Client setup failed: {0}")]
    Setup(String),
}
