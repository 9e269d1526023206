//! djtl-id library interface
//!
//! Identifies the tracks in a continuous DJ recording: the audio is split
//! into fixed segments, each segment is recognized by one or more backends,
//! and the consolidation engine folds the per-segment answers into a
//! time-bounded tracklist.

pub mod api;
pub mod audio;
pub mod config;
pub mod consolidation;
pub mod enrichment;
pub mod error;
pub mod export;
pub mod models;
pub mod recognition;
pub mod session;

pub use crate::config::Settings;
pub use crate::error::{ApiError, ApiResult};

use axum::http::HeaderValue;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last session failure for diagnostics
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Arc::new(settings),
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }
}

/// `*` allows any origin; anything else must be a single valid origin
fn cors_layer(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin.trim() == "*" {
        return layer.allow_origin(Any);
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => layer.allow_origin(value),
        Err(_) => {
            tracing::warn!(origin, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.server.cors_origin);

    Router::new()
        .merge(api::health_routes())
        .merge(api::recognizer_routes())
        .merge(api::track_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
