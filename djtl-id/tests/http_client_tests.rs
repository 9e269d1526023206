//! AcoustID and MusicBrainz clients against a local mock server

use std::collections::HashMap;
use std::net::SocketAddr;

use axum::{
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Form, Json, Router,
};
use djtl_id::enrichment::MusicBrainzEnricher;
use djtl_id::models::ConsolidatedTrack;
use djtl_id::recognition::acoustid::AcoustIdRecognizer;
use djtl_id::recognition::{Recognition, RecognitionError};
use serde_json::json;

async fn lookup(Form(form): Form<HashMap<String, String>>) -> impl IntoResponse {
    if form.get("client").map(String::as_str) == Some("bad-key") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "error": { "code": 4, "message": "invalid API key" } })),
        );
    }

    match form.get("fingerprint").map(String::as_str) {
        Some("busy") => (StatusCode::SERVICE_UNAVAILABLE, Json(json!({}))),
        Some("unknown") => (StatusCode::OK, Json(json!({ "status": "ok", "results": [] }))),
        _ => (
            StatusCode::OK,
            Json(json!({
                "status": "ok",
                "results": [
                    { "id": "low", "score": 0.41, "recordings": [
                        { "id": "rec-low", "title": "Wrong Song", "artists": [{ "name": "Nobody" }] }
                    ]},
                    { "id": "high", "score": 0.97, "recordings": [
                        { "id": "rec-high", "title": "Windowlicker", "artists": [
                            { "name": "Aphex Twin" }, { "name": "Richard D. James" }
                        ]}
                    ]}
                ]
            })),
        ),
    }
}

async fn recording_search(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let query = params.get("query").cloned().unwrap_or_default();
    if query.contains("Windowlicker") {
        Json(json!({
            "recordings": [{
                "id": "9f4b6e0d-mbid",
                "score": 100,
                "releases": [{ "title": "Windowlicker", "date": "1999-03-22" }]
            }]
        }))
    } else {
        Json(json!({ "recordings": [] }))
    }
}

async fn spawn_mock() -> SocketAddr {
    let app = Router::new()
        .route("/v2/lookup", post(lookup))
        .route("/ws/2/recording", get(recording_search));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn recognizer(addr: SocketAddr, key: &str) -> AcoustIdRecognizer {
    AcoustIdRecognizer::new(key.to_string(), "fpcalc".into())
        .unwrap()
        .with_base_url(format!("http://{}/v2/lookup", addr))
}

#[tokio::test]
async fn test_acoustid_best_result_wins() {
    let addr = spawn_mock().await;
    let result = recognizer(addr, "test-key").lookup("AQAAfingerprint", 30.0).await.unwrap();

    assert_eq!(
        result,
        Recognition::Match {
            title: "Windowlicker".to_string(),
            artist: "Aphex Twin, Richard D. James".to_string(),
            confidence: Some(0.97),
        }
    );
}

#[tokio::test]
async fn test_acoustid_no_results() {
    let addr = spawn_mock().await;
    let result = recognizer(addr, "test-key").lookup("unknown", 30.0).await.unwrap();
    assert_eq!(result, Recognition::NoMatch);
}

#[tokio::test]
async fn test_acoustid_server_error_is_retryable() {
    let addr = spawn_mock().await;
    let err = recognizer(addr, "test-key").lookup("busy", 30.0).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Transient(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_acoustid_invalid_key_is_fatal() {
    let addr = spawn_mock().await;
    let err = recognizer(addr, "bad-key").lookup("AQAA", 30.0).await.unwrap_err();
    assert!(matches!(err, RecognitionError::Fatal(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_musicbrainz_enrichment() {
    let addr = spawn_mock().await;
    let enricher = MusicBrainzEnricher::new()
        .unwrap()
        .with_base_url(format!("http://{}/ws/2", addr));

    let track = |title: &str| ConsolidatedTrack {
        title: title.to_string(),
        artist: "Aphex Twin".to_string(),
        start: 0.0,
        end: 240.0,
        contributing_count: 8,
        source: "acoustid".to_string(),
        corroborated_by: Vec::new(),
        confidence: None,
    };

    let entries = enricher
        .enrich(vec![track("Windowlicker"), track("Unreleased Dubplate")])
        .await;

    assert_eq!(entries.len(), 2);
    let metadata = entries[0].metadata.as_ref().unwrap();
    assert_eq!(metadata.release_title.as_deref(), Some("Windowlicker"));
    assert_eq!(metadata.release_year, Some(1999));
    assert_eq!(metadata.recording_mbid.as_deref(), Some("9f4b6e0d-mbid"));
    assert!(entries[1].metadata.is_none());
    assert_eq!(entries[1].track.title, "Unreleased Dubplate");
}
