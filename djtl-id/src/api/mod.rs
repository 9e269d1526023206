//! HTTP API handlers for djtl-id
//!
//! JSON over HTTP; every handler shares [`AppState`](crate::AppState).

pub mod health;
pub mod recognizers;
pub mod tracks;

pub use health::health_routes;
pub use recognizers::recognizer_routes;
pub use tracks::track_routes;
