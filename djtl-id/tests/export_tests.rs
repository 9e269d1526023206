//! Tracklist files written to disk

use djtl_id::export::{export_all, ExportContext, ExportFormat};
use djtl_id::models::{ConsolidatedTrack, TracklistEntry};

fn entries() -> Vec<TracklistEntry> {
    TracklistEntry::from_tracks(vec![
        ConsolidatedTrack {
            title: "Can You Feel It".to_string(),
            artist: "Mr. Fingers".to_string(),
            start: 0.0,
            end: 390.0,
            contributing_count: 13,
            source: "acoustid".to_string(),
            corroborated_by: Vec::new(),
            confidence: Some(0.88),
        },
        ConsolidatedTrack {
            title: "Your Love".to_string(),
            artist: "Frankie Knuckles".to_string(),
            start: 390.0,
            end: 720.0,
            contributing_count: 11,
            source: "executable".to_string(),
            corroborated_by: vec!["acoustid".to_string()],
            confidence: None,
        },
    ])
}

#[test]
fn test_export_all_writes_file_formats_only() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = ExportContext {
        title: Some("Chicago Classics".to_string()),
        ..ExportContext::default()
    };
    let formats = ExportFormat::parse_list("console,txt,json,cue,html,mp4");

    let written = export_all(&entries(), &formats, &ctx, dir.path(), "mix").unwrap();

    let names: Vec<String> = written
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["mix.txt", "mix.json", "mix.cue", "mix.html"]);

    let txt = std::fs::read_to_string(dir.path().join("mix.txt")).unwrap();
    assert!(txt.contains("02. [06:30] Your Love - Frankie Knuckles"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("mix.json")).unwrap()).unwrap();
    assert_eq!(json["metadata"]["track_count"], 2);
    assert_eq!(json["tracks"][1]["source"], "executable");

    let cue = std::fs::read_to_string(dir.path().join("mix.cue")).unwrap();
    assert!(cue.contains("  TRACK 02 AUDIO"));
    assert!(cue.contains("    INDEX 01 06:30:00"));
}

#[test]
fn test_export_creates_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("sets").join("2024");

    let written = export_all(
        &entries(),
        &[ExportFormat::Txt],
        &ExportContext::default(),
        &nested,
        "tracklist",
    )
    .unwrap();

    assert_eq!(written.len(), 1);
    assert!(nested.join("tracklist.txt").is_file());
}
