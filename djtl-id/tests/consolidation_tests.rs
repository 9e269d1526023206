//! End-to-end tests for the consolidation engine
//!
//! Drives `run_pipeline` with hand-built detection records the way the
//! recognition layer would produce them.

use djtl_id::consolidation::{
    run_pipeline, BackendRecords, ConsolidationConfig, ConsolidationError, SimilarityScorer,
    COMBINED_SOURCE,
};
use djtl_id::models::RawDetection;

const CHUNK: f64 = 30.0;

/// One record per `Some((title, artist))` / `None`, on a 30 s grid
fn records(source: &str, script: &[Option<(&str, &str)>]) -> Vec<RawDetection> {
    script
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let start = i as f64 * CHUNK;
            match entry {
                Some((title, artist)) => {
                    RawDetection::matched(source, start, start + CHUNK, *title, *artist)
                }
                None => RawDetection::unrecognized(source, start, start + CHUNK),
            }
        })
        .collect()
}

fn config_with(min_duration: f64) -> ConsolidationConfig {
    ConsolidationConfig {
        min_duration,
        ..ConsolidationConfig::default()
    }
}

const STROBE: Option<(&str, &str)> = Some(("Strobe", "deadmau5"));
const SANDSTORM: Option<(&str, &str)> = Some(("Sandstorm", "Darude"));

#[test]
fn test_ten_segments_with_one_miss_form_one_track() {
    let mut script = vec![STROBE; 10];
    script[4] = None;

    let tracks = run_pipeline(
        &[BackendRecords::new("acoustid", records("acoustid", &script))],
        &ConsolidationConfig::default(),
    )
    .unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].title, "Strobe");
    assert_eq!(tracks[0].start, 0.0);
    assert_eq!(tracks[0].end, 300.0);
    assert_eq!(tracks[0].contributing_count, 9);
    assert_eq!(tracks[0].source, "acoustid");
}

#[test]
fn test_isolated_segment_is_filtered_out() {
    let script = vec![None, None, SANDSTORM, None, None];
    let tracks = run_pipeline(
        &[BackendRecords::new("acoustid", records("acoustid", &script))],
        &ConsolidationConfig::default(),
    )
    .unwrap();
    assert!(tracks.is_empty());
}

#[test]
fn test_gap_tolerance() {
    let script = vec![STROBE, STROBE, None, STROBE, STROBE];
    let backends = [BackendRecords::new("acoustid", records("acoustid", &script))];

    let tolerant = run_pipeline(&backends, &config_with(30.0)).unwrap();
    assert_eq!(tolerant.len(), 1);
    assert_eq!(tolerant[0].contributing_count, 4);
    assert_eq!(tolerant[0].end, 150.0);

    let strict = ConsolidationConfig {
        max_interruptions: 0,
        ..config_with(30.0)
    };
    let split = run_pipeline(&backends, &strict).unwrap();
    assert_eq!(split.len(), 2);
    assert_eq!((split[0].start, split[0].end), (0.0, 60.0));
    assert_eq!((split[1].start, split[1].end), (90.0, 150.0));
}

#[test]
fn test_threshold_is_inclusive() {
    let seed = ("Strings of Life", "Rhythim Is Rhythim");
    let variant = ("Strings of Life (Remix)", "Rhythim Is Rhythim");
    let script = vec![Some(seed), Some(variant)];
    let backends = [BackendRecords::new("acoustid", records("acoustid", &script))];

    let base = config_with(30.0);
    let score = SimilarityScorer::new(base.weights, base.metric).score(
        variant.0, variant.1, seed.0, seed.1,
    );
    assert!(score > 0.0 && score < 1.0);

    let at_threshold = ConsolidationConfig {
        similarity_threshold: score,
        ..base.clone()
    };
    let merged = run_pipeline(&backends, &at_threshold).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].title, "Strings of Life");

    let above_threshold = ConsolidationConfig {
        similarity_threshold: (score + 1e-9).min(1.0),
        ..base
    };
    let split = run_pipeline(&backends, &above_threshold).unwrap();
    assert_eq!(split.len(), 2);
}

#[test]
fn test_empty_artist_records_do_not_merge_by_default() {
    let script = vec![Some(("Intro", "")), Some(("Intro", "")), Some(("Intro", ""))];
    let backends = [BackendRecords::new("executable", records("executable", &script))];

    // title alone contributes at most the title weight
    let tracks = run_pipeline(&backends, &config_with(30.0)).unwrap();
    assert_eq!(tracks.len(), 3);
    assert!(tracks.iter().all(|t| t.contributing_count == 1 && t.artist.is_empty()));

    let lenient = ConsolidationConfig {
        similarity_threshold: 0.7,
        ..config_with(30.0)
    };
    let merged = run_pipeline(&backends, &lenient).unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].contributing_count, 3);
}

#[test]
fn test_output_is_ordered_and_disjoint() {
    let script = vec![
        STROBE, STROBE, STROBE, None, SANDSTORM, SANDSTORM, SANDSTORM, None, None, STROBE,
        STROBE, STROBE,
    ];
    let tracks = run_pipeline(
        &[BackendRecords::new("acoustid", records("acoustid", &script))],
        &ConsolidationConfig::default(),
    )
    .unwrap();

    assert_eq!(tracks.len(), 3);
    assert_eq!(
        tracks.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(),
        vec!["Strobe", "Sandstorm", "Strobe"]
    );
    for pair in tracks.windows(2) {
        assert!(pair[0].end <= pair[1].start);
    }
}

#[test]
fn test_two_backends_merge_with_corroboration() {
    let a = records("acoustid", &[SANDSTORM, SANDSTORM, SANDSTORM, None, None]);
    // executable only heard the middle of the same track
    let b = vec![
        RawDetection::unrecognized("executable", 0.0, 10.0),
        RawDetection::matched("executable", 10.0, 80.0, "Sandstorm (Radio Edit)", "Darude"),
        RawDetection::unrecognized("executable", 80.0, 150.0),
    ];

    let tracks = run_pipeline(
        &[
            BackendRecords::new("acoustid", a),
            BackendRecords::new("executable", b),
        ],
        &config_with(60.0),
    )
    .unwrap();

    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].source, "acoustid");
    assert_eq!((tracks[0].start, tracks[0].end), (0.0, 90.0));
    assert_eq!(tracks[0].contributing_count, 3);
    assert_eq!(tracks[0].corroborated_by, vec!["executable".to_string()]);
}

#[test]
fn test_uncorroborated_track_is_tagged_combined() {
    let a = records(
        "acoustid",
        &[SANDSTORM, SANDSTORM, SANDSTORM, None, None, None, STROBE, STROBE, STROBE],
    );
    let b = vec![
        RawDetection::unrecognized("executable", 0.0, 10.0),
        RawDetection::matched("executable", 10.0, 80.0, "Sandstorm", "Darude"),
        RawDetection::unrecognized("executable", 80.0, 150.0),
    ];

    let tracks = run_pipeline(
        &[
            BackendRecords::new("acoustid", a),
            BackendRecords::new("executable", b),
        ],
        &config_with(60.0),
    )
    .unwrap();

    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[0].source, "acoustid");
    assert_eq!(tracks[0].corroborated_by, vec!["executable".to_string()]);
    assert_eq!(tracks[1].title, "Strobe");
    assert_eq!(tracks[1].source, COMBINED_SOURCE);
    assert!(tracks[1].corroborated_by.is_empty());
}

#[test]
fn test_out_of_order_records_are_rejected() {
    let mut bad = records("acoustid", &[STROBE, STROBE, STROBE]);
    bad.swap(1, 2);

    let err = run_pipeline(
        &[BackendRecords::new("acoustid", bad)],
        &ConsolidationConfig::default(),
    )
    .unwrap_err();

    assert!(err.is_data_integrity());
    assert!(matches!(
        err,
        ConsolidationError::OutOfOrder { ref backend, index: 2, .. } if backend == "acoustid"
    ));
}

#[test]
fn test_empty_input() {
    let tracks = run_pipeline(
        &[BackendRecords::new("acoustid", Vec::new())],
        &ConsolidationConfig::default(),
    )
    .unwrap();
    assert!(tracks.is_empty());
}
