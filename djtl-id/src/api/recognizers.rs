//! GET /api/recognizers

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::recognition::available_recognizers;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RecognizersResponse {
    /// Every backend name the service understands
    pub recognizers: Vec<&'static str>,
    /// Backends used when a request names none
    pub default: Vec<String>,
}

pub async fn list_recognizers(State(state): State<AppState>) -> Json<RecognizersResponse> {
    Json(RecognizersResponse {
        recognizers: available_recognizers(),
        default: state.settings.recognizers.clone(),
    })
}

pub fn recognizer_routes() -> Router<AppState> {
    Router::new().route("/api/recognizers", get(list_recognizers))
}
